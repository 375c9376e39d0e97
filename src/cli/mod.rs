pub mod args;
pub mod commands;

pub use args::{GateArgs, InvokeArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser, Debug)]
#[command(name = "s3-sftp-relay")]
#[command(version = crate::VERSION)]
#[command(about = "Relay S3 uploads to an SFTP server, archive them, and report via SNS")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Without a subcommand the binary serves Lambda invocations. Configuration is read from the environment; run `s3-sftp-relay env` for the list."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Serve S3 event invocations under the Lambda runtime",
        long_about = "Lambda connects to the runtime API and handles each S3 event batch: weekend gate, download, SFTP upload to the incoming and archive paths, S3 archival, and SNS notification."
    )]
    Lambda,
    #[command(
        about = "Handle one saved S3 event locally",
        long_about = "Invoke replays an S3 event notification against the configured bucket, secret, topic and SFTP server, then prints the outcome as JSON.",
        after_help = "Example:\n    s3-sftp-relay invoke --event event.json --now 2024-06-04T10:00:00+09:00"
    )]
    Invoke(InvokeArgs),
    #[command(
        about = "Show the weekend gate decision for an instant",
        after_help = "Example:\n    s3-sftp-relay gate --now 2024-06-08T09:00:00+09:00"
    )]
    Gate(GateArgs),
    #[command(about = "List supported environment variables")]
    Env,
}

pub async fn run(args: Args) -> crate::Result<()> {
    let context = crate::logging::detect_context(args.command.as_ref());
    match args.command {
        None | Some(Command::Lambda) => commands::lambda(context).await,
        Some(Command::Invoke(invoke_args)) => commands::invoke(invoke_args, context).await,
        Some(Command::Gate(gate_args)) => commands::gate(gate_args),
        Some(Command::Env) => commands::env(),
    }
}
