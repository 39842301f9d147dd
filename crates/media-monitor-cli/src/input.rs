use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{error, warn};

/// What the interactive loop reacts to. Interactive commands and Ctrl-C
/// share one channel so every exit takes the same shutdown path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    EndOfInput,
    Interrupt,
}

/// Forward each line of `reader` on a `stdin` thread, then `EndOfInput`.
pub fn spawn_line_reader<R>(reader: R, tx: Sender<Input>) -> io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read command: {}", e);
                        break;
                    }
                }
            }
            tx.send(Input::EndOfInput).ok();
        })?;
    Ok(())
}

/// Wait for Ctrl-C on a `signals` thread and report it once.
pub fn spawn_interrupt_listener(tx: Sender<Input>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tx.send(Input::Interrupt).ok();
                    }
                    Err(e) => warn!("Ctrl-C handling unavailable: {}", e),
                }
            });
        })?;
    Ok(())
}
