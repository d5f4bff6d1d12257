//! Reads a serialized record from `./test_frame_protobuf`, writes VP9/IVF
//! bytes to `./test_frame_out`. No flags, no environment variables beyond
//! the `RUST_LOG` filter.

use std::fs;
use std::process::ExitCode;

use vp9_fuzz_codec::{encode_record, Record};

const INPUT_PATH: &str = "./test_frame_protobuf";
const OUTPUT_PATH: &str = "./test_frame_out";

fn run() -> vp9_fuzz_codec::Result<()> {
    let input = fs::read(INPUT_PATH)?;
    let record: Record = serde_json::from_slice(&input)?;

    log::debug!("loaded record with {} frame(s)", record.frames.len());
    let bytes = encode_record(&record)?;
    log::debug!("encoded {} byte(s) of VP9/IVF", bytes.len());

    fs::write(OUTPUT_PATH, bytes)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("proto_to_vp9: {err}");
            ExitCode::FAILURE
        }
    }
}
