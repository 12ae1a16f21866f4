// Internal utilities for documentation tests
// This file contains helpers that generate synthetic EDF files for doctests and tests

use std::fs;
use std::io;
use std::path::Path;

/// Builder for a small, well-formed EDF file
#[derive(Debug, Clone)]
pub struct SampleEdf {
    patient_id: String,
    recording_id: String,
    start_date: String,
    start_time: String,
    signals: usize,
    records: usize,
    samples_per_record: usize,
}

impl Default for SampleEdf {
    fn default() -> Self {
        SampleEdf {
            patient_id: "X X X X".to_string(),
            recording_id: "Startdate X X X X".to_string(),
            start_date: "15.06.20".to_string(),
            start_time: "22.10.05".to_string(),
            signals: 2,
            records: 3,
            samples_per_record: 4,
        }
    }
}

impl SampleEdf {
    pub fn patient_id(mut self, value: &str) -> Self {
        self.patient_id = value.to_string();
        self
    }

    pub fn recording_id(mut self, value: &str) -> Self {
        self.recording_id = value.to_string();
        self
    }

    pub fn start_date(mut self, value: &str) -> Self {
        self.start_date = value.to_string();
        self
    }

    pub fn signals(mut self, count: usize) -> Self {
        self.signals = count.max(1);
        self
    }

    pub fn records(mut self, count: usize) -> Self {
        self.records = count;
        self
    }

    /// Base header, signal headers and data records
    pub fn to_bytes(&self) -> Vec<u8> {
        let ns = self.signals;
        let mut bytes = Vec::new();

        // 主头部 (256字节)
        bytes.extend(pad("0", 8));
        bytes.extend(pad(&self.patient_id, 80));
        bytes.extend(pad(&self.recording_id, 80));
        bytes.extend(pad(&self.start_date, 8));
        bytes.extend(pad(&self.start_time, 8));
        bytes.extend(pad(&((ns + 1) * 256).to_string(), 8));
        bytes.extend(pad("", 44));
        bytes.extend(pad(&self.records.to_string(), 8));
        bytes.extend(pad("1", 8));
        bytes.extend(pad(&ns.to_string(), 4));

        // 信号头部，按字段分组排列
        let per_signal: [(&str, usize); 10] = [
            ("EEG", 16),
            ("AgAgCl electrode", 80),
            ("uV", 8),
            ("-200", 8),
            ("200", 8),
            ("-32768", 8),
            ("32767", 8),
            ("HP:0.1Hz", 80),
            ("", 8),
            ("", 32),
        ];
        for (index, (value, width)) in per_signal.iter().enumerate() {
            for signal in 0..ns {
                let text = match index {
                    0 => format!("{value} {signal}"),
                    8 => self.samples_per_record.to_string(),
                    _ => value.to_string(),
                };
                bytes.extend(pad(&text, *width));
            }
        }

        // 数据记录：可辨认的字节模式，便于比较
        let data_len = self.records * ns * self.samples_per_record * 2;
        bytes.extend((0..data_len).map(|i| (i * 7 % 251) as u8));
        bytes
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_bytes())
    }
}

fn pad(text: &str, width: usize) -> Vec<u8> {
    let mut field: Vec<u8> = text.chars().take(width).map(|c| c as u8).collect();
    field.resize(width, b' ');
    field
}
