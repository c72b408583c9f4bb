use super::model::Dataset;

/// Clean a loaded dataset: forward-fill every missing cell.
///
/// Consumes the dataset and returns it with the same shape and column types.
/// Non-missing cells are never touched.
pub fn preprocess_data(mut dataset: Dataset) -> Dataset {
    log::info!("Preprocessing data...");
    dataset.forward_fill();
    dataset
}

impl Dataset {
    /// Replace each missing cell with the nearest preceding non-missing value
    /// in its column. Leading missing cells stay missing.
    ///
    /// Returns the number of cells filled.
    pub fn forward_fill(&mut self) -> usize {
        // Row index of the last non-missing cell seen in each column.
        let mut last: Vec<Option<usize>> = vec![None; self.width()];
        let mut filled = 0;

        for i in 0..self.rows.len() {
            for (col, prev) in last.iter_mut().enumerate() {
                if !self.rows[i][col].is_null() {
                    *prev = Some(i);
                } else if let Some(j) = *prev {
                    let value = self.rows[j][col].clone();
                    self.rows[i][col] = value;
                    filled += 1;
                }
            }
        }

        log::debug!("Forward-filled {filled} missing cells");
        filled
    }
}
