use parking_lot::Mutex;

use super::Model;
use crate::coord::Dimension;
use crate::observer::Observable;

/// Pixel size of the view, absent until the host reports one.
#[derive(Debug, Default)]
pub struct DimensionModel {
    dimension: Mutex<Option<Dimension>>,
    observable: Observable,
}

impl DimensionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(&self) -> Option<Dimension> {
        *self.dimension.lock()
    }

    /// Records the view size. Degenerate sizes are accepted as reported.
    pub fn set_dimension(&self, dimension: Dimension) {
        *self.dimension.lock() = Some(dimension);
        self.observable.notify_observers();
    }
}

impl Model for DimensionModel {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::tests::CountingObserver;
    use std::sync::Arc;

    #[test]
    fn test_initially_absent() {
        assert_eq!(DimensionModel::new().dimension(), None);
    }

    #[test]
    fn test_set_notifies_once() {
        let model = DimensionModel::new();
        let counting = Arc::new(CountingObserver::default());
        model.add_observer(counting.clone()).unwrap();

        model.set_dimension(Dimension::new(800, 600));
        assert_eq!(model.dimension(), Some(Dimension::new(800, 600)));
        assert_eq!(counting.count(), 1);

        // Unchanged value is still one batch
        model.set_dimension(Dimension::new(800, 600));
        assert_eq!(counting.count(), 2);
    }
}
