// src/lib.rs

pub mod cli;
pub mod errors;
pub mod exec;
pub mod logger;
pub mod logging;
pub mod mailer;
pub mod make;

use std::collections::BTreeMap;

use anyhow::Context;

use crate::cli::{CliArgs, CliCommand, RunArgs, env_or, parse_env_pairs, require_env};
use crate::errors::Result;
use crate::exec::{Command, Redirections};
use crate::logger::Logger;
use crate::mailer::Mailer;
use crate::make::Make;

/// Template for the subject of the build failure report. Placeholders
/// resolve against the process environment (set by the CI server).
const FAILURE_SUBJECT: &str = "
[CI] Build job {{ BUILD_NUMBER }} has failed
";

/// Template for the body of the build failure report.
const FAILURE_BODY: &str = "
Hi,

Build job {{ BUILD_NUMBER }} has failed.

You can find the details here:

{{ BUILD_URL }}

Regards,
CI
";

/// High-level entry point used by `main.rs`.
///
/// Creates the shared logger, dispatches the subcommand, and returns the
/// exit status this process should finish with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let log = match &args.log_file {
        Some(path) => Logger::to_file(path)
            .with_context(|| format!("opening log file '{}'", path.display()))?,
        None => Logger::to_stdout(),
    };

    let result = match args.command {
        CliCommand::Run(run_args) => run_command(&log, run_args).await,
        CliCommand::E2e => run_e2e(&log).await,
        CliCommand::FullCycle => run_full_cycle(&log).await,
    };

    log.close()?;
    result
}

/// Generic streamed execution of one command.
async fn run_command(log: &Logger, args: RunArgs) -> Result<i32> {
    let mut command = Command::new(log.clone(), &args.program);
    if !args.env.is_empty() {
        command = command.env(parse_env_pairs(&args.env)?);
    }
    if let Some(cwd) = args.cwd {
        command = command.cwd(cwd);
    }

    let redirect = Redirections {
        stdin: args.stdin,
        stdout: args.stdout,
        stderr: args.stderr,
    };
    command.run_redirected(&args.args, &redirect).await
}

/// Runs the integration end-to-end tests via `make e2e_test`.
async fn run_e2e(log: &Logger) -> Result<i32> {
    let gateway_url = require_env("TEST_GATEWAY_URL")?;
    let token = require_env("TEST_OFFLINE_TOKEN")?;
    let token_url = require_env("TEST_TOKEN_URL")?;
    let openshift_version = require_env("TEST_OPENSHIFT_VERSION")?;

    log.info("Running integration end-to-end tests")?;

    let make = Make::with_program(log.clone(), env_or("MAKE", "make"));
    let variables = BTreeMap::from([
        ("test_gateway_url".to_string(), gateway_url),
        ("test_token".to_string(), token),
        ("test_token_url".to_string(), token_url),
        ("openshift_version".to_string(), openshift_version),
    ]);
    let status = make.run(&["e2e_test".to_string()], &variables).await?;

    if status != 0 {
        log.info(&format!("End-to-end tests failed with exit code {status}"))?;
    } else {
        log.info("End-to-end tests succeeded")?;
    }
    Ok(status)
}

/// Runs the full cycle tests; if they fail and an SMTP relay is
/// configured, mails the failure report before returning.
async fn run_full_cycle(log: &Logger) -> Result<i32> {
    let gateway_url = require_env("TEST_GATEWAY_URL")?;
    log.redact(&gateway_url);

    let token = require_env("TEST_OFFLINE_TOKEN")?;
    log.redact(&token);

    let smtp_server = env_or("SMTP_SERVER", "");
    let smtp_port = env_or("SMTP_PORT", "25");
    let smtp_user = env_or("SMTP_USER", "");
    let smtp_password = env_or("SMTP_PASSWORD", "");
    log.redact(&smtp_password);

    log.info("Running full cycle tests")?;

    let make = Make::with_program(log.clone(), env_or("MAKE", "make"));
    let variables = BTreeMap::from([
        ("test_gateway_url".to_string(), gateway_url),
        ("test_offline_token".to_string(), token),
    ]);
    let status = make.run(&["e2e_test".to_string()], &variables).await?;

    if status != 0 {
        log.info(&format!("Full cycle tests failed with exit code {status}"))?;
    } else {
        log.info("Full cycle tests succeeded")?;
    }

    if status != 0 && !smtp_server.is_empty() {
        let report = send_failure_report(log, &smtp_server, &smtp_port, &smtp_user, &smtp_password);
        if let Err(err) = report.await {
            // A broken mail setup must not mask the build outcome.
            log.info(&format!("Sending the failure report failed: {err}"))?;
        }
    }

    Ok(status)
}

/// Renders and sends the failure report for one failed run. The sender
/// and receiver come from `MAIL_FROM`/`MAIL_TO`, read only once a report
/// is actually due.
async fn send_failure_report(
    log: &Logger,
    server: &str,
    port: &str,
    user: &str,
    password: &str,
) -> Result<()> {
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid SMTP port '{port}'"))?;
    let sender = require_env("MAIL_FROM")?;
    let receiver = require_env("MAIL_TO")?;

    log.info("Sending e-mail notification")?;
    let mailer = Mailer::new(log.clone(), server, port).credentials(user, password);
    let data: BTreeMap<String, String> = std::env::vars().collect();
    mailer
        .send(&sender, &receiver, &data, FAILURE_SUBJECT, FAILURE_BODY)
        .await
}
