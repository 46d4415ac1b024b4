//! Profiles subcommand implementation.
//!
//! Handles the `landrec profiles` command for managing search profiles.

use crate::config::{ProfileManager, SearchProfile, DEFAULT_INSTRUMENT_TYPES};
use crate::error::CliResult;
use crate::output;
use clap::{Parser, Subcommand};

/// Manage search profiles.
#[derive(Parser, Debug)]
pub struct ProfilesCommand {
    #[command(subcommand)]
    pub action: ProfilesAction,
}

/// Profile management actions.
#[derive(Subcommand, Debug)]
pub enum ProfilesAction {
    /// List all available profiles
    List,

    /// Show details of a specific profile
    Show {
        /// Profile name
        name: String,
    },

    /// Create a new profile
    Create {
        /// Profile name
        name: String,

        /// Court locality as listed by the portal (e.g. "Norfolk City")
        #[arg(short, long)]
        locality: String,

        /// Record category
        #[arg(short = 'c', long, default_value = "Deeds and Land Records")]
        category: String,

        /// Party name query
        #[arg(short = 'n', long = "name-query", default_value = "aa")]
        name_query: String,

        /// Days to look back from today
        #[arg(long, default_value = "90")]
        lookback_days: u32,

        /// Instrument type to include (repeatable; defaults to the standard set)
        #[arg(short = 't', long = "instrument-type", value_name = "TYPE")]
        instrument_types: Vec<String>,

        /// Profile description
        #[arg(short = 'd', long)]
        description: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl ProfilesCommand {
    /// Execute the profiles command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let mut manager = ProfileManager::new()?;

        match &self.action {
            ProfilesAction::List => list_profiles(&manager, quiet),
            ProfilesAction::Show { name } => show_profile(&manager, name),
            ProfilesAction::Create {
                name,
                locality,
                category,
                name_query,
                lookback_days,
                instrument_types,
                description,
            } => {
                let types = if instrument_types.is_empty() {
                    DEFAULT_INSTRUMENT_TYPES.iter().map(|s| s.to_string()).collect()
                } else {
                    instrument_types.clone()
                };
                let profile = SearchProfile {
                    description: description.clone().unwrap_or_default(),
                    record_category: category.clone(),
                    name_query: name_query.clone(),
                    lookback_days: *lookback_days,
                    instrument_types: types,
                    ..SearchProfile::new(name, locality)
                };

                manager.create(profile)?;

                if !quiet {
                    output::print_success(&format!("Profile '{}' created successfully", name));
                }
                Ok(())
            }
            ProfilesAction::Delete { name, yes } => {
                delete_profile(&mut manager, name, *yes, quiet)
            }
        }
    }
}

fn list_profiles(manager: &ProfileManager, quiet: bool) -> CliResult<()> {
    let profiles = manager.list();

    if !quiet {
        println!(
            "\n{:<18} {:<20} {:>5}  {}",
            "NAME", "LOCALITY", "DAYS", "DESCRIPTION"
        );
        println!("{}", "-".repeat(70));
    }

    for profile in profiles {
        println!(
            "{:<18} {:<20} {:>5}  {}",
            profile.name,
            output::truncate_string(&profile.locality, 20),
            profile.lookback_days,
            output::truncate_string(&profile.description, 30)
        );
    }

    if !quiet {
        println!();
    }

    Ok(())
}

fn show_profile(manager: &ProfileManager, name: &str) -> CliResult<()> {
    let profile = manager.require(name)?;

    println!("\nProfile: {}", profile.name);
    println!("{}", "=".repeat(40));
    println!("Description:  {}", profile.description);
    println!("Locality:     {}", profile.locality);
    println!("Category:     {}", profile.record_category);
    println!("Name query:   {}", profile.name_query);
    println!("Look-back:    {} days", profile.lookback_days);
    println!("Instruments:");
    for instrument in &profile.instrument_types {
        println!("  - {}", instrument);
    }
    println!();

    Ok(())
}

fn delete_profile(
    manager: &mut ProfileManager,
    name: &str,
    yes: bool,
    quiet: bool,
) -> CliResult<()> {
    // Fails early for unknown names, before prompting.
    manager.require(name)?;

    if !yes {
        println!("Delete profile '{}'? [y/N] ", name);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    manager.delete(name)?;

    if !quiet {
        output::print_success(&format!("Profile '{}' deleted", name));
    }

    Ok(())
}
