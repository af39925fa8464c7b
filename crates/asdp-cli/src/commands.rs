use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use asdp_client::{
    ClientSettings, HttpController, SessionProvider, Toast, ToastKind, http_controller,
};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use asdp_cli::cli::{ConnectionArgs, InspectArgs, RunArgs};
use asdp_cli::summary::{print_result, print_summary, print_user};

/// Controller plus the task echoing its toasts to stderr.
struct Connected {
    controller: HttpController,
    printer: JoinHandle<()>,
}

impl Connected {
    async fn open(connection: &ConnectionArgs, settings: ClientSettings) -> Result<Self> {
        let controller = http_controller(&settings).context("create backend client")?;
        let printer = tokio::spawn(print_toasts(controller.notifier().subscribe()));
        let connected = Self {
            controller,
            printer,
        };
        connected.sign_in(connection).await?;
        Ok(connected)
    }

    async fn sign_in(&self, connection: &ConnectionArgs) -> Result<()> {
        let Some(username) = &connection.username else {
            return Ok(());
        };
        let Some(password) = &connection.password else {
            bail!("--password (or ASDP_PASSWORD) is required with --username");
        };
        let user = self
            .controller
            .session()
            .login(username, password)
            .await
            .map_err(|e| anyhow::anyhow!("sign in failed: {}", e.user_message()))?;
        info!(username = %user.username, "Signed in");
        Ok(())
    }

    /// Drop the controller and wait until every toast has been printed.
    async fn close(self) {
        let Self {
            controller,
            printer,
        } = self;
        drop(controller);
        let _ = printer.await;
    }
}

async fn print_toasts(mut toasts: Receiver<Toast>) {
    loop {
        match toasts.recv().await {
            Ok(toast) => print_toast(&toast),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Toast output fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Success => eprintln!("✓ {}", toast.message),
        ToastKind::Error => eprintln!("✗ {}", toast.message),
    }
}

/// Resolve settings: file, then environment, then command-line flags.
pub fn load_settings(connection: &ConnectionArgs) -> ClientSettings {
    let mut settings = match &connection.config {
        Some(path) => {
            let mut settings = ClientSettings::load_from(path);
            settings.apply_env();
            settings
        }
        None => ClientSettings::load(),
    };
    if let Some(server) = &connection.server {
        settings.server.base_url.clone_from(server);
    }
    if let Some(dir) = &connection.output_dir {
        settings.export.output_dir = Some(dir.clone());
    }
    settings
}

pub async fn run_inspect(connection: &ConnectionArgs, args: &InspectArgs) -> Result<()> {
    let connected = Connected::open(connection, load_settings(connection)).await?;
    let outcome = connected.controller.submit_upload(&args.file).await;
    connected.close().await;

    let summary = outcome.with_context(|| format!("upload {}", args.file.display()))?;
    print_summary(&summary);
    Ok(())
}

pub async fn run_workflow(connection: &ConnectionArgs, args: &RunArgs) -> Result<()> {
    let mut settings = load_settings(connection);
    if args.no_open {
        settings.export.open_html_reports = false;
    }
    let connected = Connected::open(connection, settings).await?;
    let outcome = workflow(&connected.controller, args).await;
    connected.close().await;
    outcome
}

async fn workflow(controller: &HttpController, args: &RunArgs) -> Result<()> {
    let summary = controller
        .submit_upload(&args.file)
        .await
        .with_context(|| format!("upload {}", args.file.display()))?;
    print_summary(&summary);

    let known: BTreeSet<&str> = summary.column_names.iter().map(String::as_str).collect();
    for column in args.named_columns().filter(|column| !known.contains(column)) {
        warn!(column, "Column not found in the uploaded dataset");
    }
    if let Some(weight) = &args.weight_column
        && !controller.numeric_columns().contains(weight)
    {
        warn!(column = %weight, "Weight column is not numeric");
    }

    controller
        .update_config(args.config_patch())
        .context("apply configuration")?;

    let result = controller.start_processing().await.context("process dataset")?;
    println!();
    print_result(&result);

    let mut failures = 0;
    let mut requested = Vec::new();
    for report in &args.reports {
        if !requested.contains(report) {
            requested.push(*report);
        }
    }
    for format in requested {
        match controller.generate_report(format.into()).await {
            Ok(path) => println!("Report: {}", path.display()),
            Err(_) => failures += 1,
        }
    }
    if args.download_data {
        match controller.download_processed_data().await {
            Ok(path) => println!("Processed data: {}", path.display()),
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        bail!("{failures} export(s) failed");
    }
    Ok(())
}

pub async fn run_whoami(connection: &ConnectionArgs) -> Result<bool> {
    let connected = Connected::open(connection, load_settings(connection)).await?;
    let user = connected.controller.session().refresh().await;
    connected.close().await;

    match user {
        Some(user) => {
            print_user(&user);
            Ok(true)
        }
        None => {
            println!("Not signed in");
            Ok(false)
        }
    }
}
