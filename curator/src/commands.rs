use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("curator")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("curator")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-s --"server" <URL> "Base URL of the web entity store")
                .required(false)
                .global(true)
                .value_parser(clap::value_parser!(Url))
                .default_value("http://127.0.0.1:9090/api/"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("show")
                .about("Display a web entity: identity, prefixes, tags and sub-entities")
                .arg(arg!(<ID>).help("The web entity id"))
                .arg(
                    arg!(--"json" "Print the raw entity record as JSON")
                        .required(false)
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the entity record as JSON to a file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("edit")
                .about("Open the interactive editor on a web entity")
                .arg(arg!(<ID>).help("The web entity id")),
        )
        .subcommand(
            command!("set")
                .about("Set one identity field (name, homepage or status)")
                .arg(arg!(<ID>).help("The web entity id"))
                .arg(
                    arg!(-f --"field" <FIELD>)
                        .required(true)
                        .help("The field to set")
                        .value_parser(["name", "homepage", "status"]),
                )
                .arg(
                    arg!(-v --"value" <VALUE>)
                        .required(true)
                        .help("The new value"),
                ),
        )
        .subcommand(
            command!("tag")
                .about("Manage tags on a web entity")
                .subcommand(
                    command!("add")
                        .about("Add a tag to a category")
                        .arg(arg!(<ID>).help("The web entity id"))
                        .arg(
                            arg!(-c --"category" <CATEGORY>)
                                .required(true)
                                .help("The tag category"),
                        )
                        .arg(arg!(-t --"tag" <TAG>).required(true).help("The tag value")),
                )
                .subcommand(
                    command!("remove")
                        .about("Remove a tag from a category")
                        .arg(arg!(<ID>).help("The web entity id"))
                        .arg(
                            arg!(-c --"category" <CATEGORY>)
                                .required(true)
                                .help("The tag category"),
                        )
                        .arg(arg!(-t --"tag" <TAG>).required(true).help("The tag value")),
                ),
        )
        .subcommand(
            command!("prefix")
                .about("Manage the LRU prefixes defining a web entity")
                .subcommand(
                    command!("add")
                        .about("Add a prefix (accepts a URL or an LRU)")
                        .arg(arg!(<ID>).help("The web entity id"))
                        .arg(
                            arg!(-p --"prefix" <PREFIX>)
                                .required(true)
                                .help("The prefix, as a URL or in LRU form"),
                        ),
                )
                .subcommand(
                    command!("remove")
                        .about("Remove a prefix (an entity keeps at least one)")
                        .arg(arg!(<ID>).help("The web entity id"))
                        .arg(
                            arg!(-p --"prefix" <PREFIX>)
                                .required(true)
                                .help("The prefix, as a URL or in LRU form"),
                        ),
                ),
        )
}
