use std::io::{self, Write};

/// Value plotted for a packet carrying the marker bit.
pub const MARKER_TIME_POINT_MS: i64 = 20;

/// Upper bound of a plotted delta.
pub const TIME_POINT_CAP_MS: i64 = 200;

/// Plotted timing of one packet: marked packets sit on the nominal frame
/// interval, everything else is its delta capped at 200 ms.
pub fn time_point(marker: bool, delta_ms: i64) -> i64 {
    if marker {
        MARKER_TIME_POINT_MS
    } else {
        delta_ms.min(TIME_POINT_CAP_MS)
    }
}

/// Writes `"<packet>, <value>"` lines for plotting.
pub struct TimePointWriter<W: Write> {
    inner: W,
    points: u64,
}

impl<W: Write> TimePointWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, points: 0 }
    }

    pub fn write_point(&mut self, packet_index: u64, marker: bool, delta_ms: i64) -> io::Result<()> {
        writeln!(self.inner, "{}, {}", packet_index, time_point(marker, delta_ms))?;
        self.points += 1;
        Ok(())
    }

    pub fn points_written(&self) -> u64 {
        self.points
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_point_values() {
        assert_eq!(time_point(true, 900), 20);
        assert_eq!(time_point(false, 900), 200);
        assert_eq!(time_point(false, 19), 19);
        assert_eq!(time_point(false, 200), 200);
    }

    #[test]
    fn test_lines() {
        let mut writer = TimePointWriter::new(Vec::new());
        writer.write_point(1, false, 20).unwrap();
        writer.write_point(2, true, 45).unwrap();
        writer.write_point(3, false, 1_000).unwrap();
        assert_eq!(writer.points_written(), 3);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "1, 20\n2, 20\n3, 200\n");
    }
}
