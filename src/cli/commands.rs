use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    ClientConfig, ServerConfig, DEFAULT_BIND, DEFAULT_CACHE_DIR, DEFAULT_DATA_FILE, DEFAULT_PORT,
    DEFAULT_SERVER_URL,
};

#[derive(Parser, Debug)]
#[command(name = "mealplan")]
#[command(version, about = "A household meal plan editor")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the meal plan page and API
    Serve(ServeArgs),

    /// Print every field of the meal plan
    Show {
        #[command(flatten)]
        client: ClientArgs,

        /// Output the whole document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one field's value
    Get {
        /// Field key, e.g. "day3-meal1-title"
        key: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Edit one field and save the plan
    Set {
        /// Field key, e.g. "day3-meal1-ingredients"
        key: String,

        /// New value; `[label](url)` becomes a link
        value: String,

        #[command(flatten)]
        client: ClientArgs,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the editable fields on the page
    Fields,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// JSON file holding the meal plan (created on first run)
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Serve this HTML file at `/` instead of the built-in page
    #[arg(long)]
    pub page: Option<PathBuf>,
}

impl ServeArgs {
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind.clone(),
            port: self.port,
            data_file: self.data_file.clone(),
            page: self.page.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Meal plan server URL
    #[arg(long, env = "MEALPLAN_SERVER", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Directory used when the server is unreachable
    #[arg(long, env = "MEALPLAN_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

impl ClientArgs {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server.clone(),
            cache_dir: self.cache_dir.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}
