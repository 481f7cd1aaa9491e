//! Spatial partitioning for collision broad phase and neighbour queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force.

use crate::components::{Collider, CollisionLayer, Health, MarkedForDeletion, Transform};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Entities are bucketed by the cell of their centre. Box queries widen the
/// searched cell range by the largest half extent seen this tick, so large
/// hitboxes centred in a neighbouring cell are still found.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in pixels.
    pub cell_size: f32,
    /// Map from cell coordinates to list of entities in that cell.
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, (i32, i32)>,
    max_half_extent: f32,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
    pub layer: CollisionLayer,
}

impl SpatialEntry {
    pub fn transform(&self) -> Transform {
        Transform::new(self.x, self.y)
    }

    pub fn collider(&self) -> Collider {
        Collider {
            half_width: self.half_width,
            half_height: self.half_height,
            layer: self.layer,
        }
    }

    fn distance_sq(&self, x: f32, y: f32) -> f32 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
            max_half_extent: 0.0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call at start of each frame before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
        self.max_half_extent = 0.0;
    }

    /// Insert an entity with its hitbox.
    pub fn insert(&mut self, entity: Entity, at: &Transform, collider: &Collider) {
        if !(at.x.is_finite() && at.y.is_finite()) {
            return;
        }
        let cell = self.world_to_cell(at.x, at.y);

        // Remove from old cell if moved
        if let Some(&old_cell) = self.entity_cells.get(&entity) {
            if let Some(entries) = self.cells.get_mut(&old_cell) {
                entries.retain(|e| e.entity != entity);
            }
        }

        let entry = SpatialEntry {
            entity,
            x: at.x,
            y: at.y,
            half_width: collider.half_width,
            half_height: collider.half_height,
            layer: collider.layer,
        };
        self.max_half_extent = self
            .max_half_extent
            .max(collider.half_width)
            .max(collider.half_height);
        self.cells.entry(cell).or_default().push(entry);
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the grid.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| e.entity != entity);
            }
        }
    }

    fn entries_near(&self, x: f32, y: f32, reach: f32) -> impl Iterator<Item = &SpatialEntry> {
        let span = (reach / self.cell_size).ceil() as i32;
        let (cx, cy) = self.world_to_cell(x, y);
        (-span..=span)
            .flat_map(move |dx| (-span..=span).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
    }

    /// Entities of `layer` whose hitbox overlaps the given box.
    /// Sorted by entity so iteration order never depends on hashing.
    pub fn query_overlapping(&self, at: &Transform, collider: &Collider, layer: CollisionLayer) -> Vec<SpatialEntry> {
        let reach = collider.half_width.max(collider.half_height) + self.max_half_extent;
        let mut results: Vec<SpatialEntry> = self
            .entries_near(at.x, at.y, reach)
            .filter(|e| e.layer == layer && collider.overlaps(at, &e.collider(), &e.transform()))
            .copied()
            .collect();
        results.sort_by_key(|e| e.entity);
        results
    }

    /// Query all entities within a radius of a point.
    /// Returns entries sorted by distance (closest first), ties by entity.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32, layer: Option<CollisionLayer>) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        let mut results: Vec<SpatialEntry> = self
            .entries_near(x, y, radius)
            .filter(|e| layer.map_or(true, |l| e.layer == l) && e.distance_sq(x, y) <= radius_sq)
            .copied()
            .collect();

        results.sort_by(|a, b| {
            a.distance_sq(x, y)
                .partial_cmp(&b.distance_sq(x, y))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        results
    }

    /// Get count of entities in a cell.
    pub fn cell_count(&self, cell: (i32, i32)) -> usize {
        self.cells.get(&cell).map(|v| v.len()).unwrap_or(0)
    }

    /// Get total entity count.
    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }
}

/// System that rebuilds the spatial grid from every live collider.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &Transform, &Collider, Option<&Health>), Without<MarkedForDeletion>>,
) {
    grid.clear();

    for (entity, transform, collider, health) in query.iter() {
        if health.is_some_and(|h| !h.is_alive()) {
            continue;
        }
        grid.insert(entity, transform, collider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy_box(size: f32) -> Collider {
        Collider::new(size, size, CollisionLayer::Enemy)
    }

    #[test]
    fn test_spatial_grid_insert_query() {
        let mut grid = SpatialGrid::new(10.0);

        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);
        let e3 = Entity::from_raw(3);

        grid.insert(e1, &Transform::new(5.0, 5.0), &enemy_box(2.0));
        grid.insert(e2, &Transform::new(15.0, 5.0), &enemy_box(2.0));
        grid.insert(e3, &Transform::new(100.0, 100.0), &Collider::point(CollisionLayer::Powerup));

        let nearby = grid.query_radius(5.0, 5.0, 15.0, None);
        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].entity, e1);

        let nearby = grid.query_radius(5.0, 5.0, 5.0, None);
        assert_eq!(nearby.len(), 1);

        assert!(grid.query_radius(100.0, 100.0, 10.0, Some(CollisionLayer::Enemy)).is_empty());
        assert_eq!(grid.total_count(), 3);
    }

    #[test]
    fn test_large_hitbox_found_from_neighbouring_cell() {
        let mut grid = SpatialGrid::new(10.0);
        let boss = Entity::from_raw(7);
        grid.insert(boss, &Transform::new(0.0, 0.0), &enemy_box(96.0));

        let bullet = Collider::point(CollisionLayer::PlayerBullet);
        let hits = grid.query_overlapping(&Transform::new(47.0, -40.0), &bullet, CollisionLayer::Enemy);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, boss);

        let misses = grid.query_overlapping(&Transform::new(49.0, 0.0), &bullet, CollisionLayer::Enemy);
        assert!(misses.is_empty());
    }

    #[test]
    fn test_radius_query_breaks_distance_ties_by_entity() {
        let mut grid = SpatialGrid::new(10.0);
        let near_b = Entity::from_raw(9);
        let near_a = Entity::from_raw(4);
        grid.insert(near_b, &Transform::new(20.0, 0.0), &enemy_box(4.0));
        grid.insert(near_a, &Transform::new(-20.0, 0.0), &enemy_box(4.0));
        grid.insert(Entity::from_raw(1), &Transform::new(30.0, 0.0), &enemy_box(4.0));

        let found: Vec<Entity> = grid
            .query_radius(0.0, 0.0, 50.0, Some(CollisionLayer::Enemy))
            .into_iter()
            .map(|e| e.entity)
            .collect();
        assert_eq!(found, vec![near_a, near_b, Entity::from_raw(1)]);
    }

    #[test]
    fn test_reinsert_moves_entity() {
        let mut grid = SpatialGrid::new(10.0);
        let e = Entity::from_raw(1);
        grid.insert(e, &Transform::new(5.0, 5.0), &enemy_box(1.0));
        grid.insert(e, &Transform::new(55.0, 5.0), &enemy_box(1.0));
        assert_eq!(grid.cell_count((0, 0)), 0);
        assert_eq!(grid.cell_count((5, 0)), 1);
        grid.remove(e);
        assert_eq!(grid.total_count(), 0);
    }
}
