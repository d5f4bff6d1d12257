//! Reads VP9/IVF bytes from `./test_frame_in`, writes a serialized record to
//! `./test_frame_protobuf`.

use std::fs;
use std::process::ExitCode;

use vp9_fuzz_codec::parse_record;

const INPUT_PATH: &str = "./test_frame_in";
const OUTPUT_PATH: &str = "./test_frame_protobuf";

fn run() -> vp9_fuzz_codec::Result<()> {
    let input = fs::read(INPUT_PATH)?;
    log::debug!("read {} byte(s) of VP9/IVF", input.len());

    let record = parse_record(&input)?;
    log::debug!("parsed {} frame(s)", record.frames.len());

    let output = serde_json::to_vec(&record)?;
    fs::write(OUTPUT_PATH, output)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vp9_to_proto: {err}");
            ExitCode::FAILURE
        }
    }
}
