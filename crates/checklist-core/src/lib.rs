pub mod alert;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod export;
pub mod form;
pub mod html;
pub mod render;
pub mod service;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting checklist CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.checklistrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .chain(cli.url.map(|url| {
        ("service.url".to_string(), url)
      }))
  );

  let service_url = cfg.service_url();
  let service =
    service::HttpTaskService::new(
      &service_url
    )
    .with_context(|| {
      format!(
        "failed to set up task service \
         at {service_url}"
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let mut controller =
    controller::SyncController::new(
      service,
      alert::TerminalNotifier,
      renderer
    );
  let mut form = form::FormHandler::new();

  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut controller,
    &mut form,
    &cfg,
    inv
  )?;

  info!("done");
  Ok(())
}
