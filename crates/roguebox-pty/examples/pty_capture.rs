//! Capture raw PTY output from a command.
//!
//! Usage: cargo run --example pty_capture -- /bin/ls -l

use std::path::PathBuf;
use std::time::Duration;

use roguebox_pty::{ProcessDriver, PtyProcess};

fn main() {
    let mut args = std::env::args().skip(1);
    let command = PathBuf::from(args.next().unwrap_or_else(|| "/bin/echo".to_string()));
    let rest: Vec<String> = args.collect();

    let mut driver = match PtyProcess::spawn(&command, &rest) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("spawn failed: {e}");
            std::process::exit(1);
        }
    };

    let mut buf = [0u8; 4096];
    let mut idle = 0;
    while idle < 20 {
        match driver.read_nonblocking(&mut buf) {
            Ok(0) => {
                if !driver.is_alive() {
                    break;
                }
                idle += 1;
                std::thread::sleep(Duration::from_millis(25));
            }
            Ok(n) => {
                idle = 0;
                print!("{}", String::from_utf8_lossy(&buf[..n]));
            }
            Err(e) => {
                eprintln!("read failed: {e}");
                break;
            }
        }
    }
}
