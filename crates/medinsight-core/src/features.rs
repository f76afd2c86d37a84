//! Model input for the no-show classifier.

/// Column order the classifier is trained and scored with.
pub const FEATURE_NAMES: [&str; 4] = ["age", "distance", "lead_time", "previous_no_shows"];

/// The four appointment attributes the no-show model scores.
///
/// Values are taken as given: negative ages or lead times are not
/// rejected, they are handed to the model unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub age: i64,
    /// Distance to the clinic in kilometres.
    pub distance: f64,
    /// Days between booking and appointment.
    pub lead_time: i64,
    pub previous_no_shows: i64,
}

impl FeatureVector {
    pub fn new(age: i64, distance: f64, lead_time: i64, previous_no_shows: i64) -> Self {
        Self {
            age,
            distance,
            lead_time,
            previous_no_shows,
        }
    }

    /// Features as a dense row, in [`FEATURE_NAMES`] order.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.age as f64,
            self.distance,
            self.lead_time as f64,
            self.previous_no_shows as f64,
        ]
    }
}
