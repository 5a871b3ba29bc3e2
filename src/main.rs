use std::process::ExitCode;

fn main() -> ExitCode {
    match tracktime_lib::run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("tracktime: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
