use super::datapoint::DataPoint;

/// Append-only buffer of data points for the running session.
/// Insertion order is the serialization order; nothing here ever sorts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQueue {
    points: Vec<DataPoint>,
}

impl DataQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataPoint> {
        self.points.iter()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Snapshot-and-swap: hands back everything queued so far and leaves an
    /// empty queue in place for appends that arrive afterwards.
    pub fn take(&mut self) -> DataQueue {
        std::mem::take(self)
    }

    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }
}
