use std::io::Write;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};

use crate::encoder::{Record, RecordEncoder};

/// A layer writing every event it sees as one encoded line.
///
/// Stacking two of these on one registry gives a tee: e.g. JSON into a file
/// and console text on stdout.
pub struct RecordLayer<W> {
    encoder: RecordEncoder,
    make_writer: W,
}

impl<W> RecordLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    pub fn new(encoder: RecordEncoder, make_writer: W) -> Self {
        Self {
            encoder,
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for RecordLayer<W>
where
    S: Subscriber,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let record = Record::from_event(event);
        let line = self.encoder.encode(&record);

        // Write failures lose the record; there is nowhere left to report them.
        let mut writer = self.make_writer.make_writer_for(event.metadata());
        let _ = writer.write_all(line.as_bytes());
    }
}
