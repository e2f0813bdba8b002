//! # Purpose
//! Walk through the anonymous overlay end to end: load anonymous settings,
//! wrap an in-memory subject, act anonymously, then log in and out.
//!
//! # High-level flow
//! 1. Load settings from `MASQUE_ANONYMOUS_*` env vars and an optional YAML file.
//! 2. Build an in-memory realm with one demo account.
//! 3. Create an overlaid subject for an unauthenticated request and activate it.
//! 4. Probe roles, permissions and session creation anonymously.
//! 5. Log in with the given credentials and probe again; then log out.
use anyhow::{Context, Result};
use clap::Parser;
use masque_anonymous::{AnonymousSettings, LiveConfigurationSource, OverlayFactory};
use masque_authz::{PermissionResolver, WildcardPermissionResolver};
use masque_common::observability::init_tracing;
use masque_subject::{
    AuthenticationToken, DEFAULT_REALM, InMemoryRealm, InMemorySubjectFactory, Subject,
    SubjectContext,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "quickstart")]
#[command(about = "Anonymous identity overlay walkthrough")]
struct Args {
    /// YAML file overriding MASQUE_ANONYMOUS_* settings
    #[arg(long)]
    config: Option<String>,

    /// Force anonymous access on regardless of configuration
    #[arg(long)]
    enable: bool,

    /// Deny session creation for anonymous subjects
    #[arg(long)]
    no_anonymous_sessions: bool,

    /// Extra anonymous role (repeatable)
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Extra anonymous permission (repeatable)
    #[arg(long = "permission")]
    permissions: Vec<String>,

    /// Demo account user name
    #[arg(long, default_value = "alice")]
    username: String,

    /// Password submitted at login (the demo account password is "secret")
    #[arg(long, default_value = "secret")]
    password: String,

    /// Permissions probed before and after login
    #[arg(long = "probe", default_values = ["read:doc1", "write:doc1"])]
    probes: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("quickstart");

    let mut settings = AnonymousSettings::from_env_or_yaml(args.config.as_deref())
        .context("load anonymous settings")?;
    if args.enable {
        settings.enabled = true;
    }
    if args.no_anonymous_sessions {
        settings.session_creation_enabled = false;
    }
    settings.roles.extend(args.roles.iter().cloned());
    settings.permissions.extend(args.permissions.iter().cloned());
    info!(?settings, "anonymous settings loaded");

    let resolver: Arc<dyn PermissionResolver> = Arc::new(WildcardPermissionResolver::new());
    let source = Arc::new(
        LiveConfigurationSource::from_settings(&settings, resolver.as_ref())
            .context("resolve anonymous profile")?,
    );

    let realm = InMemoryRealm::new(DEFAULT_REALM, resolver.clone());
    realm
        .add_account("alice", "secret", &["user"], &["read:*", "write:doc1"])
        .context("add demo account")?;
    let factory = OverlayFactory::new(
        InMemorySubjectFactory::new(Arc::new(realm)),
        source,
        resolver,
    );

    let context = SubjectContext::new().with_host("127.0.0.1");
    let mut subject = factory.create(&context);

    let activation = subject.activate();
    println!("activation: {activation:?}");
    println!(
        "anonymous principal: {}",
        subject
            .anonymous_principals()
            .map(|principals| principals.primary().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    report(&mut subject, &args.probes, "anonymous");

    let token = AuthenticationToken::new(args.username.as_str(), args.password.as_str());
    match subject.login(&token) {
        Ok(()) => println!("login as {}: ok", args.username),
        Err(err) => {
            warn!(error = %err, "login failed");
            println!("login as {}: {err}", args.username);
        }
    }
    report(&mut subject, &args.probes, "after login");

    subject.logout();
    println!("after logout: anonymous={}", subject.is_anonymous());
    Ok(())
}

fn report(subject: &mut masque_anonymous::IdentityOverlay, probes: &[String], label: &str) {
    println!(
        "[{label}] anonymous={} authenticated={} principal={}",
        subject.is_anonymous(),
        subject.is_authenticated(),
        subject
            .principal()
            .map(|principal| principal.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    for role in ["guest", "user"] {
        println!("[{label}] role {role}: {}", subject.has_role(role));
    }
    for probe in probes {
        println!("[{label}] permission {probe}: {}", subject.is_permitted(probe.into()));
    }
    let session = subject.session(true);
    println!(
        "[{label}] session: {}",
        session
            .map(|session| session.id().to_string())
            .unwrap_or_else(|| "not created".to_string())
    );
}
