//! Emitter: writes snapshots in the i3bar/swaybar JSON protocol
//!
//! The stream starts with a header object and an opening bracket, each on
//! its own line. Every snapshot then becomes one line holding a JSON array
//! followed by a comma.

use super::aggregator::SnapshotReceiver;
use log::{debug, trace};
use rg_status_core::Snapshot;
use rg_status_types::Header;
use std::future::Future;
use std::io::{self, Write};

/// Serializes snapshots to a line-oriented sink
pub struct Emitter<W: Write> {
    writer: W,
    header: Header,
}

impl<W: Write> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header: Header::default(),
        }
    }

    /// Use a non-default protocol header
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    /// Write the header, then one line per snapshot until `shutdown` fires
    ///
    /// Also returns when every sender is gone. Shutdown is checked before
    /// each receive and a line is always written whole, so stopping never
    /// leaves a truncated line behind. Returns the number of snapshots
    /// written.
    pub async fn run<F>(&mut self, mut rx: SnapshotReceiver, shutdown: F) -> io::Result<usize>
    where
        F: Future<Output = ()>,
    {
        self.write_header()?;

        tokio::pin!(shutdown);
        let mut written = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("Shutdown requested after {} snapshots", written);
                    break;
                }
                next = rx.recv() => match next {
                    Some(snapshot) => {
                        self.write_snapshot(&snapshot)?;
                        written += 1;
                    }
                    None => {
                        debug!("All producers stopped after {} snapshots", written);
                        break;
                    }
                },
            }
        }

        Ok(written)
    }

    fn write_header(&mut self) -> io::Result<()> {
        let header = serde_json::to_string(&self.header)?;
        writeln!(self.writer, "{}", header)?;
        writeln!(self.writer, "[")?;
        self.writer.flush()
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let line = snapshot.to_line()?;
        trace!("Emitting {}", line);
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
