//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, Sender};
use labflow_rs::column::ColumnValues;
use labflow_rs::{ColumnMode, DataSink, ImportCommit, ImportMode};
use mockall::mock;

mock! {
    pub Sink {}

    impl DataSink for Sink {
        fn prepare_import(
            &mut self,
            buffers: &mut Vec<ColumnValues>,
            mode: ImportMode,
            rows: usize,
            cols: usize,
            names: &[String],
            modes: &[ColumnMode],
        ) -> usize;

        fn finalize_import(&mut self, buffers: Vec<ColumnValues>, commit: ImportCommit);

        fn clear(&mut self);
    }
}

/// Create a progress channel with room for every percentage
pub fn create_progress_channel() -> (Sender<u8>, Receiver<u8>) {
    bounded(128)
}

/// A sink mock that stages buffers like a real sink and expects exactly one
/// finalize, handing the committed buffers to `on_commit`.
pub fn staging_sink(
    on_commit: impl FnMut(Vec<ColumnValues>, ImportCommit) + Send + 'static,
) -> MockSink {
    let mut sink = MockSink::new();
    sink.expect_prepare_import()
        .times(1)
        .returning(|buffers, _, rows, cols, _, modes| {
            buffers.clear();
            for col in 0..cols {
                let mode = modes.get(col).copied().unwrap_or(ColumnMode::Double);
                buffers.push(ColumnValues::new(mode, rows));
            }
            0
        });
    sink.expect_finalize_import().times(1).returning(on_commit);
    sink.expect_clear().never();
    sink
}
