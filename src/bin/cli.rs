//! Linkcom command line interface.

use std::{io::BufRead, process, sync::Arc, thread, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
    ArgMatches,
};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use linkcom::{
    self as lc, DataBits, DecodedMessage, FlowControl, LinkId, Outgoing, Parity, StopBits,
};

fn main() {
    println!("[LC] linkcom v{}", crate_version!());

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Linkcom listens on a command link and, optionally, a telemetry \
            link. Text received on a link is accumulated until a delimiter \
            token arrives: \n\
               \t* `MSG_END` closes a message, printed percent-encoded \n\
               \t* `FTP_END` closes a file transfer, printed percent-encoded \n\
            \n\
            Lines typed on stdin are written to the command link.\n\
            \n\
            Press Ctrl+C to cancel all reads and close the devices.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .setting(ArgRequiredElseHelp)
        .arg(
            Arg::with_name("COMMAND_TTY")
                .help("the tty device of the command link")
                .short("-c")
                .long("--command")
                .takes_value(true)
                .require_equals(true)
                .required_unless("TELEMETRY_TTY"),
        )
        .arg(
            Arg::with_name("TELEMETRY_TTY")
                .help("the tty device of the telemetry link")
                .short("-t")
                .long("--telemetry")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("COMMAND_BAUD")
                .help("baud rate of the command link")
                .short("-b")
                .long("--command-baud")
                .takes_value(true)
                .default_value("57600")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("TELEMETRY_BAUD")
                .help("baud rate of the telemetry link")
                .short("-B")
                .long("--telemetry-baud")
                .takes_value(true)
                .default_value("9600")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .short("-d")
                .long("--data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .short("-s")
                .long("--stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .short("-p")
                .long("--parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("handshake mode")
                .short("-f")
                .long("--flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("READ_TIMEOUT")
                .help("read timeout in milliseconds, 0 to wait forever")
                .long("--read-timeout")
                .takes_value(true)
                .default_value("1000")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("WRITE_TIMEOUT")
                .help("write timeout in milliseconds")
                .long("--write-timeout")
                .takes_value(true)
                .default_value("1000")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("MAX_FRAME")
                .help("largest frame buffered while waiting for a delimiter")
                .long("--max-frame")
                .takes_value(true)
                .default_value("65536")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("UNESCAPE")
                .help("print payloads decoded instead of percent-encoded")
                .short("-u")
                .long("--unescape"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'linkcom -v -v -v' or 'linkcom -vvv' vs 'linkcom -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(err) = TermLogger::init(log_level, Config::default(), TerminalMode::Mixed) {
        eprintln!("could not set up logging: {}", err);
    }

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let command_baud = numeric_or_exit::<u32>(&matches, "COMMAND_BAUD", "command-baud");
    let telemetry_baud = numeric_or_exit::<u32>(&matches, "TELEMETRY_BAUD", "telemetry-baud");
    let read_timeout = numeric_or_exit::<u64>(&matches, "READ_TIMEOUT", "read-timeout");
    let write_timeout = numeric_or_exit::<u64>(&matches, "WRITE_TIMEOUT", "write-timeout");
    let max_frame = numeric_or_exit::<usize>(&matches, "MAX_FRAME", "max-frame");

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    let unescape = matches.is_present("UNESCAPE");

    // END - Arguments with default values =====================================

    let settings = |path: &str, baud_rate: u32| {
        lc::SettingsBuilder::default()
            .path(path)
            .baud_rate(baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(flow_control)
            .read_timeout(match read_timeout {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            })
            .write_timeout(Duration::from_millis(write_timeout))
            .max_frame_len(max_frame)
            .finalize()
    };

    let mut links = Vec::new();
    if let Some(path) = matches.value_of("COMMAND_TTY") {
        links.push((LinkId::Command, settings(path, command_baud)));
    }
    if let Some(path) = matches.value_of("TELEMETRY_TTY") {
        links.push((LinkId::Telemetry, settings(path, telemetry_baud)));
    }
    let write_link = links[0].0;

    // END - Arguments =========================================================

    // Run the state machine ===================================================

    let sink = Arc::new(move |message: DecodedMessage| print_message(&message, unescape));
    let station = lc::Station::new(links, Box::new(lc::SerialConnector), sink);

    let stop = station.stop_handle();
    ctrlc::set_handler(move || {
        if stop.cancel() {
            println!("🛑 received Ctrl+C!");
        } else {
            process::exit(0);
        }
    })
    .expect("Failed to install my Ctrl-C handler!");

    let outbox = station.outbox();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let text = match line {
                Ok(text) => text,
                Err(_) => break,
            };
            if text.is_empty() {
                println!("[LC] Enter the text you want to write");
                continue;
            }
            let outgoing = Outgoing {
                link: write_link,
                text,
            };
            if outbox.send(outgoing).is_err() {
                break;
            }
        }
    });

    let exit_code = station.run();
    debug!("exit code: {}", exit_code);
    std::process::exit(exit_code.into());
}

fn print_message(message: &DecodedMessage, unescape: bool) {
    let payload = if unescape {
        match lc::unescape(&message.payload) {
            Ok(text) => text,
            Err(_) => message.payload.clone(),
        }
    } else {
        message.payload.clone()
    };
    println!(
        "[LC] {} {} {}",
        style(message.link).cyan(),
        style(message.kind).dim(),
        payload
    );
}

fn numeric_or_exit<T: std::str::FromStr>(matches: &ArgMatches, name: &str, long: &str) -> T {
    value_t!(matches.value_of(name), T).unwrap_or_else(|_| {
        println!(
            "{}: `{}` needs to be a numeric value",
            style("error").red(),
            style(long).cyan()
        );
        println!(
            "   {} `{}` is not a valid value",
            style("-->").cyan(),
            style(matches.value_of(name).unwrap_or_default()).on_red()
        );
        process::exit(-1);
    })
}
