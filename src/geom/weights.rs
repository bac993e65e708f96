//! Named per-vertex weight channels.

/// Name of the channel that drives relief displacement.
pub const EMBOSS_CHANNEL: &str = "emboss";

/// One scalar per vertex, indexed like the owning mesh's vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMap {
    name: String,
    values: Vec<f64>,
}

impl WeightMap {
    /// Creates a channel with every vertex at `fill`.
    #[must_use]
    pub fn new(name: impl Into<String>, vertex_count: usize, fill: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![fill; vertex_count],
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Weight of `vertex`, 0 for indices past the end.
    #[must_use]
    pub fn get(&self, vertex: usize) -> f64 {
        self.values.get(vertex).copied().unwrap_or(0.0)
    }

    /// Sets the weight of `vertex`, clamped to `[0, 1]`. Out of range is a no-op.
    pub fn set(&mut self, vertex: usize, weight: f64) {
        if let Some(slot) = self.values.get_mut(vertex) {
            *slot = weight.clamp(0.0, 1.0);
        }
    }

    /// Replaces every value; `values` must match the channel length.
    pub(crate) fn assign(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.values.len());
        self.values = values;
    }

    /// Grows or shrinks to `vertex_count`, new slots start at 0.
    pub(crate) fn resize(&mut self, vertex_count: usize) {
        self.values.resize(vertex_count, 0.0);
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Indices whose weight is exactly 1.
    #[must_use]
    pub fn full_weight_vertices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, w)| **w == 1.0)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_and_ignores_out_of_range() {
        let mut map = WeightMap::new(EMBOSS_CHANNEL, 3, 0.0);
        map.set(0, 1.5);
        map.set(1, -0.25);
        map.set(7, 1.0);
        assert_eq!(map.values(), &[1.0, 0.0, 0.0]);
        assert_eq!(map.full_weight_vertices(), vec![0]);
        assert_eq!(map.get(7), 0.0);
    }
}
