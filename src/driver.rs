//! Async host loop: a tokio interval stands in for the external clock and
//! feeds elapsed time into the scheduler, while operator commands arrive as
//! lines on the console reader.
use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::console::{ConsoleCommand, Flow};
use crate::scheduler::{AutosaveScheduler, Clock, SaveTrigger};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Run until `quit` is entered or `shutdown` resolves. A closed console only
/// stops command handling; ticks keep flowing.
pub async fn run<T, C, R, S>(
    scheduler: &mut AutosaveScheduler<T, C>,
    tick_period: Duration,
    console: R,
    shutdown: S,
) -> crate::Result<()>
where
    T: SaveTrigger,
    C: Clock,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(tick_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    let mut lines = console.lines();
    let mut console_open = true;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            now = interval.tick() => {
                let elapsed = now.saturating_duration_since(last_tick);
                last_tick = now;
                scheduler.tick(elapsed);
            }
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) => match ConsoleCommand::parse(&line) {
                    Ok(Some(command)) => match command.execute(scheduler)? {
                        Flow::Continue(reply) => println!("{}", reply),
                        Flow::Quit => {
                            info!("Quit requested from console");
                            break;
                        }
                    },
                    Ok(None) => {}
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => {
                    debug!("Console closed; continuing without operator commands");
                    console_open = false;
                }
                Err(e) => {
                    warn!("Console read failed: {}", e);
                    console_open = false;
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::writer::BackupWriter;
    use tempfile::TempDir;
    use tokio::io::BufReader;

    fn scheduler(tmp_dir: &TempDir) -> AutosaveScheduler<impl FnMut()> {
        let working = tmp_dir.path().join("work.xml");
        std::fs::write(&working, "<design/>").unwrap();
        let writer = BackupWriter::new(tmp_dir.path().join("backups"));
        writer.ensure_dir().unwrap();
        AutosaveScheduler::new(Configuration::default(), working, writer, || {})
    }

    #[tokio::test]
    async fn test_console_backup_then_quit() {
        let tmp_dir = TempDir::new().unwrap();
        let mut scheduler = scheduler(&tmp_dir);
        let console = tokio_test::io::Builder::new().read(b"backup\n\nbackup\nquit\n").build();

        run(
            &mut scheduler,
            Duration::from_millis(10),
            BufReader::new(console),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        let stats = scheduler.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(scheduler.writer().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ticks_continue_after_console_closes() {
        let tmp_dir = TempDir::new().unwrap();
        let mut scheduler = scheduler(&tmp_dir);
        let console = tokio_test::io::Builder::new().read(b"bogus\n").build();

        run(
            &mut scheduler,
            Duration::from_millis(5),
            BufReader::new(console),
            tokio::time::sleep(Duration::from_millis(60)),
        )
        .await
        .unwrap();

        assert!(scheduler.state().time_to_next_autosave < 300.0);
        assert_eq!(scheduler.stats().attempts, 0);
    }
}
