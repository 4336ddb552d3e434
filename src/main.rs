use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};

use dmc_compress::{
    decode_stream, encode_stream, DmcError, DmcOptions, ExitCode, ModelKind, ModelMetrics,
};

fn print_usage() {
    eprintln!(
        "usage: dmc_util [-e | -d] [-m braid|byte] [-A <uint> -B <uint>] <inputfile>\n\
         \n\
         \x20 -e    encode <inputfile> into <inputfile>.dmc (default)\n\
         \x20 -d    decode <inputfile> into <inputfile>.raw\n\
         \x20 -m    initial model topology, braid or byte (default braid)\n\
         \x20 -A/-B cloning thresholds; both must be > 0 to replace the 16/16 defaults\n\
         \n\
         prints <cloning count>\\t<state count> on success"
    );
}

struct CliRequest {
    decode: bool,
    options: DmcOptions,
    input_path: PathBuf,
}

fn bad_arguments(message: &str) -> anyhow::Error {
    anyhow::Error::new(DmcError::new(ExitCode::BadCliArguments, message))
}

fn parse_arguments() -> Result<CliRequest> {
    // -e and -d may both appear; the later one wins, so the mode has to be
    // read off the raw argument order before pico-args swallows the flags
    let mut decode = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-e" => decode = false,
            "-d" => decode = true,
            _ => {}
        }
    }

    let mut args = pico_args::Arguments::from_env();
    while args.contains("-e") || args.contains("-d") {}

    let mut options = DmcOptions::default();

    if let Some(model_name) = args
        .opt_value_from_str::<_, String>("-m")
        .map_err(|e| bad_arguments(&e.to_string()))?
    {
        options.model_kind = ModelKind::from_name(&model_name);
        if options.model_kind == ModelKind::Braid && model_name != "braid" {
            warn!("unknown model '{model_name}', falling back to braid");
        }
    }

    let threshold1: u32 = args
        .opt_value_from_str("-A")
        .map_err(|e| bad_arguments(&e.to_string()))?
        .unwrap_or(0);
    let threshold2: u32 = args
        .opt_value_from_str("-B")
        .map_err(|e| bad_arguments(&e.to_string()))?
        .unwrap_or(0);

    // both thresholds must be overridden together; a lone or zero value
    // leaves the defaults in place
    if threshold1 > 0 && threshold2 > 0 {
        options.cloning_threshold1 = threshold1;
        options.cloning_threshold2 = threshold2;
    }

    let input_path: PathBuf = args
        .opt_free_from_str()
        .map_err(|e| bad_arguments(&e.to_string()))?
        .ok_or_else(|| bad_arguments("missing input file"))?;

    let leftover = args.finish();
    if !leftover.is_empty() {
        return Err(bad_arguments(&format!(
            "unrecognized arguments: {leftover:?}"
        )));
    }

    return Ok(CliRequest {
        decode,
        options,
        input_path,
    });
}

fn process(request: &CliRequest) -> Result<ModelMetrics> {
    let suffix = if request.decode { ".raw" } else { ".dmc" };
    let mut output_name = request.input_path.clone().into_os_string();
    output_name.push(suffix);
    let output_path = PathBuf::from(output_name);

    let input_file = File::open(&request.input_path)
        .map_err(DmcError::from)
        .with_context(|| format!("cannot open {}", request.input_path.display()))?;

    let output_file = File::create(&output_path)
        .map_err(DmcError::from)
        .with_context(|| format!("cannot open {}", output_path.display()))?;

    let mut reader = BufReader::with_capacity(1 << 16, input_file);
    let writer = BufWriter::with_capacity(1 << 16, output_file);

    let start = Instant::now();
    let metrics = if request.decode {
        decode_stream(&mut reader, writer, &request.options)?
    } else {
        encode_stream(&mut reader, writer, &request.options)?
    };

    info!(
        "{} -> {} in {:.2?}",
        request.input_path.display(),
        output_path.display(),
        start.elapsed()
    );

    return Ok(metrics);
}

fn main_with_result() -> Result<()> {
    let request = parse_arguments()?;
    let metrics = process(&request)?;

    // the one line of machine-readable output this tool has always had
    println!("{}\t{}", metrics.cloning_count, metrics.state_count);

    return Ok(());
}

fn main() {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
    {
        eprintln!("logger initialization failed: {e}");
    }

    match main_with_result() {
        Ok(()) => {}
        Err(e) => {
            if let Some(dmc_error) = e.root_cause().downcast_ref::<DmcError>() {
                if dmc_error.exit_code() == ExitCode::BadCliArguments {
                    print_usage();
                }
                eprintln!("{:#}", e);
                std::process::exit(dmc_error.exit_code().as_process_code());
            }

            eprintln!("{:#}", e);
            std::process::exit(ExitCode::GeneralFailure.as_process_code());
        }
    }
}
