mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result, WrapErr};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use opencga_client::types::HostUrl;
use opencga_client::{LogicalQuery, Params, RestResponse};

use crate::state::CliState;

#[derive(Parser)]
#[clap(
    author, version, about, long_about = None,
    propagate_version = false, disable_help_subcommand = true
)]
struct Cli {
    /// OpenCGA host, e.g. https://ws.opencb.org/opencga-prod
    #[clap(long, env = "OPENCGA_HOST")]
    host: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// User ID
        #[clap(short, long)]
        user: String,

        /// Password (prompted for if not given)
        #[clap(long)]
        password: Option<String>,
    },

    /// Forget the session
    Logout {},

    /// Print the user of the current session
    Whoami {},

    /// Get new tokens using the refresh token
    Refresh {},

    /// Run a GET query, e.g. `opencga get samples search -p study=1000G`
    Get {
        category: String,
        action: String,

        /// Resource ID(s), comma-separated
        #[clap(long)]
        id: Option<String>,

        /// Query parameter as key=value
        #[clap(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Number of results, may exceed the server's page size
        #[clap(long)]
        limit: Option<usize>,

        /// Number of results to skip
        #[clap(long)]
        skip: Option<usize>,
    },

    /// Upload a file
    Upload {
        file: PathBuf,

        /// Form field as key=value, e.g. study=1000G
        #[clap(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Download a file from the catalog
    Download {
        /// File ID or path, e.g. data:HG00096.vcf.gz
        file: String,

        /// Local file or directory to write to
        #[clap(long, default_value = ".")]
        to: PathBuf,

        /// Query parameter as key=value, e.g. study=1000G
        #[clap(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got \"{}\"", s))
}

fn to_params(pairs: Vec<(String, String)>) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Cli = Cli::parse();
    let mut state = CliState::load()?;
    if let Some(host) = args.host {
        state.config.rest.host = HostUrl::try_from(host)?;
    }
    let mut client = state.client()?;

    match args.command {
        Commands::Login { user, password } => {
            let password = match password {
                Some(p) => p,
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .interact()?,
            };
            client
                .login(&user, &password)
                .wrap_err_with(|| format!("Could not log in as \"{}\"", user))?;
            state.save_session(&client)?;
            eprintln!("Logged in as {}", user);
        }
        Commands::Logout {} => {
            client.logout();
            state.save_session(&client)?;
        }
        Commands::Whoami {} => {
            let user = client
                .session()
                .require_user_id()
                .wrap_err("Not logged in, please run `opencga login`")?;
            println!("{}", user);
        }
        Commands::Refresh {} => {
            client.refresh()?;
            state.save_session(&client)?;
        }
        Commands::Get {
            category,
            action,
            id,
            params,
            limit,
            skip,
        } => {
            let mut query = LogicalQuery::get(category, action).params(to_params(params));
            if let Some(id) = id {
                query = query.id(id);
            }
            if let Some(limit) = limit {
                query = query.param("limit", limit);
            }
            if let Some(skip) = skip {
                query = query.param("skip", skip);
            }
            let res = client.execute(query)?;
            print_results(res)?;
        }
        Commands::Upload { file, params } => {
            if !file.is_file() {
                bail!("File not found: {:?}", file);
            }
            let res = client.files().upload(&file, to_params(params))?;
            print_results(res)?;
        }
        Commands::Download { file, to, params } => {
            let written = client
                .files()
                .download(&file, &to, to_params(params))
                .wrap_err_with(|| format!("Could not download \"{}\"", file))?;
            eprintln!("Downloaded {} to {:?}", file, written);
        }
    }
    Ok(())
}

fn print_results(res: RestResponse<Value>) -> Result<()> {
    for event in res
        .events
        .iter()
        .chain(res.responses.iter().flat_map(|p| p.events.iter()))
    {
        eprintln!(
            "{:?}: {}",
            event.event_type,
            event.message.as_deref().unwrap_or_default()
        );
    }
    if res.first_error_message().is_some() {
        bail!("The server reported an error");
    }
    for result in res.into_results() {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}
