//! Test data builders for binary sources and recording filters

use labflow_rs::column::{Column, ColumnRef};
use labflow_rs::import::MemorySource;
use labflow_rs::pipeline::{Arity, Filter, InputContext, InputNotice};
use labflow_rs::ByteOrder;
use std::cell::RefCell;
use std::rc::Rc;

/// Builder for binary test sources holding `i32` records
pub struct BinarySourceBuilder {
    header: usize,
    padding: usize,
    trailing: usize,
    byte_order: ByteOrder,
    records: Vec<Vec<i32>>,
}

impl BinarySourceBuilder {
    pub fn new() -> Self {
        Self {
            header: 0,
            padding: 0,
            trailing: 0,
            byte_order: ByteOrder::LittleEndian,
            records: Vec::new(),
        }
    }

    /// Header bytes before the first record
    pub fn header(mut self, bytes: usize) -> Self {
        self.header = bytes;
        self
    }

    /// Padding bytes before every element
    pub fn padding(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }

    /// Garbage bytes after the last full record
    pub fn trailing(mut self, bytes: usize) -> Self {
        self.trailing = bytes;
        self
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn record(mut self, values: &[i32]) -> Self {
        self.records.push(values.to_vec());
        self
    }

    /// `count` records of `vectors` elements; element `j` of record `i`
    /// is `(i + 1) * 10 + j`.
    pub fn counting(mut self, count: usize, vectors: usize) -> Self {
        for i in 0..count {
            let record = (0..vectors).map(|j| ((i + 1) * 10 + j) as i32).collect();
            self.records.push(record);
        }
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0xEE; self.header];
        for record in &self.records {
            for value in record {
                bytes.extend(std::iter::repeat(0xAA).take(self.padding));
                match self.byte_order {
                    ByteOrder::LittleEndian => bytes.extend_from_slice(&value.to_le_bytes()),
                    ByteOrder::BigEndian => bytes.extend_from_slice(&value.to_be_bytes()),
                }
            }
        }
        bytes.extend(std::iter::repeat(0x55).take(self.trailing));
        bytes
    }

    pub fn build(self) -> MemorySource {
        MemorySource::new(self.bytes()).with_label("builder")
    }
}

impl Default for BinarySourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Log of notices received by a [`RecordingFilter`]
pub type NoticeLog = Rc<RefCell<Vec<(usize, InputNotice)>>>;

/// Filter that records every notice and accepts any column
pub struct RecordingFilter {
    arity: Arity,
    log: NoticeLog,
    output: ColumnRef,
}

impl RecordingFilter {
    pub fn new(arity: Arity) -> (Self, NoticeLog) {
        let log: NoticeLog = Rc::new(RefCell::new(Vec::new()));
        let filter = Self {
            arity,
            log: log.clone(),
            output: Column::new("recorded", labflow_rs::ColumnMode::Double),
        };
        (filter, log)
    }
}

impl Filter for RecordingFilter {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn input_count(&self) -> Arity {
        self.arity
    }

    fn output_count(&self) -> usize {
        1
    }

    fn output(&self, port: usize) -> Option<ColumnRef> {
        (port == 0).then(|| self.output.clone())
    }

    fn on_input(&mut self, ctx: &InputContext<'_>, notice: InputNotice) {
        self.log.borrow_mut().push((ctx.port(), notice));
    }
}

/// Count notices matching `notice` in `log`
pub fn count_notices(log: &NoticeLog, notice: InputNotice) -> usize {
    log.borrow().iter().filter(|(_, n)| *n == notice).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_source_builder() {
        let bytes = BinarySourceBuilder::new()
            .header(2)
            .padding(1)
            .record(&[1])
            .trailing(3)
            .bytes();

        assert_eq!(bytes.len(), 2 + 1 + 4 + 3);
        assert_eq!(&bytes[3..7], &1i32.to_le_bytes());
    }
}
