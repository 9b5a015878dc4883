use colored::Colorize;
use commands::command_argument_builder;
use curator::handlers;
use curator_core::print_banner;
use curator_core::tags::TagOp;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("show", sub)) => {
            tracing_subscriber::fmt::init();
            handlers::handle_show(sub).await
        }
        Some(("edit", sub)) => {
            // No fmt logging here: it would write over the editor screen.
            handlers::handle_edit(sub).await
        }
        Some(("set", sub)) => {
            tracing_subscriber::fmt::init();
            handlers::handle_set(sub).await
        }
        Some(("tag", sub)) => {
            tracing_subscriber::fmt::init();
            match sub.subcommand() {
                Some(("add", sub)) => handlers::handle_tag(sub, TagOp::Add).await,
                Some(("remove", sub)) => handlers::handle_tag(sub, TagOp::Remove).await,
                _ => unreachable!("clap should ensure we don't get here"),
            }
        }
        Some(("prefix", sub)) => {
            tracing_subscriber::fmt::init();
            match sub.subcommand() {
                Some(("add", sub)) => handlers::handle_prefix(sub, true).await,
                Some(("remove", sub)) => handlers::handle_prefix(sub, false).await,
                _ => unreachable!("clap should ensure we don't get here"),
            }
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
