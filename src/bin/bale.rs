use std::process;

use bale::{Archive, Outcome};
use clap::{App, AppSettings, Arg, ArgMatches};

fn archive_arg() -> Arg<'static> {
    Arg::new("archive")
        .value_name("ARCHIVE")
        .help("The archive to operate on")
        .takes_value(true)
        .required(true)
}

fn files_arg() -> Arg<'static> {
    Arg::new("files")
        .value_name("FILE")
        .help("The files to add")
        .takes_value(true)
        .multiple_values(true)
}

fn main() {
    env_logger::init();

    let matches = App::new("bale")
        .version("0.1.0")
        .author("chordtoll <git@chordtoll.com>")
        .about("Builds, inspects, and unpacks ustar tar archives of regular files")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            App::new("create")
                .about("Build a new archive from the given files, overwriting any existing one")
                .arg(archive_arg())
                .arg(files_arg()),
        )
        .subcommand(
            App::new("append")
                .about("Add the given files to an existing archive unconditionally")
                .arg(archive_arg())
                .arg(files_arg()),
        )
        .subcommand(
            App::new("update")
                .about("Add only the given files whose name is absent from the archive")
                .arg(archive_arg())
                .arg(files_arg()),
        )
        .subcommand(
            App::new("list")
                .about("Print every entry name, in on-disk order")
                .arg(archive_arg()),
        )
        .subcommand(
            App::new("extract")
                .about("Recreate every entry's file in the current directory")
                .arg(archive_arg()),
        )
        .get_matches();

    let code = match matches.subcommand() {
        Some(("create", sub)) => create(sub),
        Some(("append", sub)) => best_effort(sub, |archive, files| archive.append(files)),
        Some(("update", sub)) => best_effort(sub, |archive, files| archive.update(files)),
        Some(("list", sub)) => list(sub),
        Some(("extract", sub)) => extract(sub),
        _ => unreachable!(),
    };
    process::exit(code);
}

fn archive_of(sub: &ArgMatches) -> Archive {
    Archive::new(sub.value_of("archive").unwrap())
}

fn files_of(sub: &ArgMatches) -> Vec<String> {
    sub.values_of("files")
        .map(|v| v.map(str::to_string).collect())
        .unwrap_or_default()
}

fn create(sub: &ArgMatches) -> i32 {
    match archive_of(sub).create(&files_of(sub)) {
        Ok(()) => 0,
        Err(e) => fail(e),
    }
}

fn best_effort<F>(sub: &ArgMatches, op: F) -> i32
where
    F: FnOnce(&Archive, &[String]) -> anyhow::Result<Outcome>,
{
    match op(&archive_of(sub), &files_of(sub)) {
        Ok(outcome) => report(&outcome),
        Err(e) => fail(e),
    }
}

fn list(sub: &ArgMatches) -> i32 {
    match archive_of(sub).list() {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            0
        }
        Err(e) => fail(e),
    }
}

fn extract(sub: &ArgMatches) -> i32 {
    match archive_of(sub).extract() {
        Ok(outcome) => report(&outcome),
        Err(e) => fail(e),
    }
}

/// Entry-level failures are diagnostics, not a failed run: the archive is
/// still usable, so the exit status stays zero.
fn report(outcome: &Outcome) -> i32 {
    for (name, e) in &outcome.failed {
        eprintln!("bale: {}: {:#}", name, e);
    }
    0
}

fn fail(e: anyhow::Error) -> i32 {
    eprintln!("bale: {:#}", e);
    1
}
