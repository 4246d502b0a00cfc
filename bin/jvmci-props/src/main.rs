use jvmci::services;

use clap::{Arg, ArgMatches, Command};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

/// Ways the tool can fail
#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Properties(services::Error),
    BadProperty(String),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> CliError {
        CliError::Io(err)
    }
}

impl From<services::Error> for CliError {
    fn from(err: services::Error) -> CliError {
        CliError::Properties(err)
    }
}

fn main() -> Result<(), CliError> {
    env_logger::init();

    let file_arg = || {
        Arg::new("FILE")
            .help("Serialized saved properties")
            .required(true)
            .index(1)
    };
    let matches = Command::new("Saved properties tool")
        .version(clap::crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Inspect and build the serialized system properties handed to the compiler")
        .subcommand_required(true)
        .subcommand(
            Command::new("dump")
                .about("Print all properties as `name=value` lines, sorted by name")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("get")
                .about("Print the value of one property")
                .arg(file_arg())
                .arg(Arg::new("NAME").required(true).index(2))
                .arg(
                    Arg::new("default")
                        .long("default")
                        .value_name("VALUE")
                        .help("Value to print if the property is not set"),
                ),
        )
        .subcommand(
            Command::new("pack")
                .about("Write properties given on the command line")
                .arg(Arg::new("OUTPUT").required(true).index(1))
                .arg(
                    Arg::new("PROPERTY")
                        .help("Property as `name=value`")
                        .num_args(0..)
                        .index(2),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("dump", sub_matches)) => dump(sub_matches),
        Some(("get", sub_matches)) => get(sub_matches),
        Some(("pack", sub_matches)) => pack(sub_matches),
        _ => Ok(()),
    }
}

/// Read the input file and install it as the process-wide saved properties
fn load(matches: &ArgMatches) -> Result<&'static HashMap<String, String>, CliError> {
    let file = matches
        .get_one::<String>("FILE")
        .expect("FILE is a required argument");
    log::info!("Reading '{}'", file);
    let bytes = fs::read(file)?;
    Ok(services::initialize_saved_properties(&bytes)?)
}

fn dump(matches: &ArgMatches) -> Result<(), CliError> {
    let properties = load(matches)?;
    let mut sorted: Vec<_> = properties.iter().collect();
    sorted.sort();
    for (name, value) in sorted {
        println!("{}={}", name, value);
    }
    Ok(())
}

fn get(matches: &ArgMatches) -> Result<(), CliError> {
    load(matches)?;
    let name = matches
        .get_one::<String>("NAME")
        .expect("NAME is a required argument");
    let value = match matches.get_one::<String>("default") {
        Some(default) => Some(services::saved_property_or(name, default)?),
        None => services::saved_property(name)?,
    };
    match value {
        Some(value) => println!("{}", value),
        None => log::warn!("Property '{}' is not set", name),
    }
    Ok(())
}

fn pack(matches: &ArgMatches) -> Result<(), CliError> {
    let output = matches
        .get_one::<String>("OUTPUT")
        .expect("OUTPUT is a required argument");

    let mut properties = HashMap::new();
    for property in matches.get_many::<String>("PROPERTY").into_iter().flatten() {
        let (name, value) = property
            .split_once('=')
            .ok_or_else(|| CliError::BadProperty(property.clone()))?;
        if properties
            .insert(name.to_owned(), value.to_owned())
            .is_some()
        {
            log::warn!("Property '{}' given more than once, keeping the last value", name);
        }
    }

    log::info!("Writing {} properties to '{}'", properties.len(), output);
    let mut writer = BufWriter::new(File::create(output)?);
    services::serialize_properties(&properties, &mut writer)?;
    writer.flush()?;
    Ok(())
}
