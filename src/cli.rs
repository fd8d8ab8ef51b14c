use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::models::Resource;

#[derive(Parser)]
#[command(name = "rosecandle")]
#[command(about = "Back-office client for the Rose Candle Co. REST API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of a resource
    List {
        /// Resource to list (suppliers, products, employees, ...)
        resource: Resource,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Show a single item
    Show {
        resource: Resource,
        id: String,
    },

    /// Create an item from field assignments or a JSON body
    Create {
        resource: Resource,

        /// Field assignment, repeatable (e.g. --set name=Velas)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Raw JSON object sent as the request body
        #[arg(long, conflicts_with = "set")]
        json: Option<String>,
    },

    /// Update an item
    Update {
        resource: Resource,
        id: String,

        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        #[arg(long, conflicts_with = "set")]
        json: Option<String>,
    },

    /// Delete an item after confirmation
    Delete {
        resource: Resource,
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive list and detail session
    Browse {
        resource: Resource,
    },

    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        user: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Check the stored session against the server
    Whoami,

    /// Show or edit the signed-in employee
    Profile {
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Home metrics, low stock, best sellers and monthly sales
    Dashboard {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reset a forgotten password by e-mail code
    Recover {
        #[arg(short, long)]
        email: String,
    },
}

impl Commands {
    /// Split `key=value` assignments
    pub fn parse_assignments(assignments: &[String]) -> Result<Vec<(String, String)>, anyhow::Error> {
        assignments
            .iter()
            .map(|assignment| {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", assignment))?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(anyhow::anyhow!("Empty field name in '{}'", assignment));
                }
                Ok((key.to_string(), value.to_string()))
            })
            .collect()
    }

    pub fn parse_json_body(body: &str) -> Result<Map<String, Value>, anyhow::Error> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(obj) => Ok(obj),
            other => Err(anyhow::anyhow!("Request body must be a JSON object, got {}", other)),
        }
    }
}
