//! List the first few assets under a repository folder.
//!
//! This is the thin collaborator around the library: it maps environment
//! variables onto the settings object, prints asset records, and maps
//! errors to exit codes. Required: DPRES_USERNAME, DPRES_PASSWORD,
//! DPRES_TENANT, DPRES_SERVER. Optional: DPRES_FOLDER, DPRES_LIMIT,
//! DPRES_VERBOSE.
//!
//! ```bash
//! DPRES_SERVER=https://repo.example.org \
//! DPRES_TENANT=museum \
//! DPRES_USERNAME=archivist \
//! DPRES_PASSWORD=... \
//! cargo run --example list_assets
//! ```

use dpres_dl::{Config, CredentialsConfig, EntityRef, Session, descendants, fetch, is_asset};
use futures::{StreamExt, pin_mut};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let config = match config_from_env() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn config_from_env() -> Result<Config, String> {
    let mut config = Config {
        credentials: CredentialsConfig {
            username: env_or_empty("DPRES_USERNAME"),
            password: env_or_empty("DPRES_PASSWORD"),
            tenant: env_or_empty("DPRES_TENANT"),
            server_address: env_or_empty("DPRES_SERVER"),
        },
        ..Default::default()
    };
    if let Ok(folder) = std::env::var("DPRES_FOLDER") {
        config.query.folder_reference = Some(folder);
    }
    if let Ok(limit) = std::env::var("DPRES_LIMIT") {
        config.query.limit = limit
            .parse()
            .map_err(|_| format!("DPRES_LIMIT must be a positive integer, got {limit:?}"))?;
    }
    config.query.verbose = std::env::var("DPRES_VERBOSE").is_ok_and(|v| v == "1" || v == "true");
    Ok(config)
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

async fn run(config: &Config) -> dpres_dl::Result<()> {
    // Validation happens inside open(), before any network call.
    let session = Session::open(config).await?;

    let root = config.query.folder_reference.clone().map(EntityRef::from);
    {
        let stream = descendants(&session, root.as_ref());
        pin_mut!(stream);

        let mut printed = 0usize;
        while printed < config.query.limit {
            let Some(entity) = stream.next().await else {
                break;
            };
            let entity = entity?;
            if !is_asset(&entity) {
                continue;
            }
            if config.query.verbose {
                // List pages carry abbreviated records; resolve the full entity.
                let detail = fetch(&session, &entity.reference).await?;
                println!("{}  {}", detail.entity.reference, detail.entity.title);
                if let Some(description) = &detail.entity.description {
                    println!("    {description}");
                }
                println!("    security tag: {}", detail.entity.security_tag);
            } else {
                println!("{}  {}", entity.reference, entity.title);
            }
            printed += 1;
        }
    }

    session.close();
    Ok(())
}
