//! Example describing one service's variables across three environments.
//!
//! This example shows how to:
//! - Register environments with their own runtime data and resolutions
//! - Bind every variable per environment, including dynamic values
//! - Pick the environment at startup with a dynamic resolver
//! - Export the secrets a deployment target expects as a `.env` file
//!
//! Run with: cargo run --example deployment
//! Pick the environment with `APP_ENV=local|ci|production`.

use envar_registry::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Local development reads the process environment.
struct LocalData {
    env: HashMap<String, String>,
}

/// CI injects secrets into the job.
struct CiData {
    secrets: HashMap<String, String>,
}

/// Production reads from a remote secret store.
struct ProductionData {
    store_url: String,
}

fn environments() -> Result<EnvironmentRegistry> {
    EnvironmentRegistry::new()
        .add_env("local", define_type::<LocalData>(), |env| {
            env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
                .add_resolution("from-env", define_type::<Option<String>>(), |i| {
                    let key = i.payload.as_deref().unwrap_or(&i.variable_name);
                    i.env_data.env.get(key).cloned()
                })
        })?
        .add_env("ci", define_type::<CiData>(), |env| {
            env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
                .add_resolution("secrets", define_type::<()>(), |i| {
                    i.env_data.secrets.get(&i.variable_name).cloned()
                })
        })?
        .add_env("production", define_type::<ProductionData>(), |env| {
            env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
                .add_async_resolution("secret-store", define_type::<String>(), |i| async move {
                    // Stand-in for a network call to the store.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    format!("{}/{}", i.env_data.store_url, i.payload)
                })
        })
}

fn variables(environments: &EnvironmentRegistry) -> Result<VariableRegistry> {
    let shared = environments
        .create_variable_registry()
        .add_var("LOG_LEVEL", |var| {
            var.for_env("local", "hardcoded", "debug".to_string())?
                .for_env("ci", "hardcoded", "info".to_string())?
                .for_env("production", "hardcoded", "warn".to_string())
        })?;

    let service = environments
        .create_variable_registry()
        .add_var("DATABASE_URL", |var| {
            var.for_env("local", "from-env", Some("LOCAL_DATABASE_URL".to_string()))?
                .for_env_without_payload("ci", "secrets")?
                .for_env("production", "secret-store", "db/primary".to_string())
        })?
        .add_var("RELEASE", |var| {
            var.for_env("local", "hardcoded", "dev".to_string())?
                .dynamic_for("ci", "commit_sha")?
                .dynamic_for("production", "release_tag")
        })?;

    shared.merge_with(&service)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Deployment Environments Example ===\n");

    let environments = environments()?;
    let variables = variables(&environments)?;

    for env in environments.environment_names() {
        let tags: Vec<_> = environments
            .environment(env)
            .map(|e| e.tags().collect())
            .unwrap_or_default();
        println!("{:<12} resolutions: {:?}", env, tags);
    }
    println!();

    let candidates = CandidateEnvironments::new()
        .with_env(
            "local",
            LocalData {
                env: HashMap::from([(
                    "LOCAL_DATABASE_URL".to_string(),
                    "postgres://localhost/dev".to_string(),
                )]),
            },
        )
        .with_dynamic(
            "ci",
            CiData {
                secrets: HashMap::from([(
                    "DATABASE_URL".to_string(),
                    "postgres://ci-db/test".to_string(),
                )]),
            },
            [("commit_sha", "3f2a9c1")],
        )
        .with_dynamic(
            "production",
            ProductionData {
                store_url: "vault://secrets".to_string(),
            },
            [("release_tag", "v1.4.0")],
        );

    let resolver = variables.create_dynamic_resolver(candidates, || {
        std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string())
    })?;
    println!("Bound environment: {}", resolver.env_name());

    for name in resolver.registry().variable_names() {
        println!("  {} is {}", name, resolver.status_of(name)?);
    }
    println!();

    let all = resolver.get_all()?.await?;
    println!("--- Resolved variables ---");
    for (name, value) in all.iter() {
        println!("  {}={}", name, value);
    }
    println!();

    if resolver.env_name() != "ci" {
        let ci_secrets = resolver.get_all_for("ci", "secrets")?.await?;
        println!("--- Values for CI secrets (.env) ---");
        print!("{}", ci_secrets.to_dotenv());
    }

    Ok(())
}
