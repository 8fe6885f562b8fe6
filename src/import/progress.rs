//! Progress reporting for long decodes.
//!
//! Decoders report an integer percentage through a [`ProgressReporter`].
//! A decode running on a worker thread can forward its progress to the
//! caller's thread with [`channel_reporter`].

use crossbeam_channel::Sender;

/// Receives an integer percentage, 0..=100.
pub type ProgressReporter<'a> = dyn FnMut(u8) + 'a;

/// Forward progress over a channel. Send failures (receiver gone) are
/// ignored.
pub fn channel_reporter(tx: Sender<u8>) -> impl FnMut(u8) {
    move |percent| {
        let _ = tx.try_send(percent);
    }
}

/// Turns row counts into percentages.
pub(crate) struct RowProgress<'a> {
    total: usize,
    report: &'a mut ProgressReporter<'a>,
}

impl<'a> RowProgress<'a> {
    pub(crate) fn new(total: usize, report: &'a mut ProgressReporter<'a>) -> Self {
        Self { total, report }
    }

    /// Report after `done` rows; silent when there are no rows.
    pub(crate) fn row_done(&mut self, done: usize) {
        if self.total > 0 {
            let percent = (100 * done.min(self.total) / self.total) as u8;
            (self.report)(percent);
        }
    }
}
