//! DBSCAN clustering of relay coordinates.
//!
//! Distances are Euclidean in the (longitude, latitude) plane, in degrees.
//! Neighbour queries go through an R-tree.

use std::collections::VecDeque;

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::models::Coordinate;

/// A group of nearby relays drawn as one marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Mean position of the members
    pub centroid: Coordinate,
    /// Number of relays in the cluster (at least 1)
    pub count: usize,
}

/// Label assigned to each point by DBSCAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-tree over the input points, keyed by position in the input slice.
struct NeighbourIndex {
    tree: RTree<IndexedPoint>,
    eps_squared: f64,
}

impl NeighbourIndex {
    fn new(points: &[Coordinate], eps: f64) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(idx, point)| IndexedPoint::new(plane(point), idx))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            eps_squared: eps * eps,
        }
    }

    /// Indices of all points within `eps` of `point`, itself included.
    fn neighbours(&self, point: &Coordinate) -> Vec<usize> {
        self.tree
            .locate_within_distance(plane(point), self.eps_squared)
            .map(|entry| entry.data)
            .collect()
    }
}

fn plane(point: &Coordinate) -> [f64; 2] {
    [point.longitude, point.latitude]
}

/// Groups coordinates with DBSCAN.
///
/// Points labelled as noise (only possible with `min_samples > 1`) become
/// single-member clusters, so every input point is represented exactly once:
/// the counts always sum to `points.len()`. Clusters are returned in the order
/// their first member appears; noise singletons follow.
pub fn cluster_coordinates(points: &[Coordinate], eps: f64, min_samples: usize) -> Vec<Cluster> {
    if points.is_empty() {
        return Vec::new();
    }
    if !eps.is_finite() || eps <= 0.0 {
        return points
            .iter()
            .map(|&centroid| Cluster { centroid, count: 1 })
            .collect();
    }

    let min_samples = min_samples.max(1);
    let index = NeighbourIndex::new(points, eps);
    let mut labels = vec![Label::Unvisited; points.len()];
    let mut next_cluster = 0usize;

    for start in 0..points.len() {
        if labels[start] != Label::Unvisited {
            continue;
        }
        let seeds = index.neighbours(&points[start]);
        if seeds.len() < min_samples {
            labels[start] = Label::Noise;
            continue;
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[start] = Label::Cluster(cluster_id);

        let mut queue: VecDeque<usize> = seeds.into_iter().collect();
        while let Some(idx) = queue.pop_front() {
            match labels[idx] {
                Label::Cluster(_) => continue,
                // Border point: joins the cluster but does not expand it
                Label::Noise => {
                    labels[idx] = Label::Cluster(cluster_id);
                    continue;
                }
                Label::Unvisited => labels[idx] = Label::Cluster(cluster_id),
            }
            let neighbours = index.neighbours(&points[idx]);
            if neighbours.len() >= min_samples {
                queue.extend(neighbours);
            }
        }
    }

    summarize(points, &labels, next_cluster)
}

fn summarize(points: &[Coordinate], labels: &[Label], cluster_count: usize) -> Vec<Cluster> {
    // (sum_lat, sum_lon, count) per cluster id
    let mut sums = vec![(0.0_f64, 0.0_f64, 0usize); cluster_count];
    let mut noise = Vec::new();

    for (point, label) in points.iter().zip(labels) {
        match label {
            Label::Cluster(id) => {
                let entry = &mut sums[*id];
                entry.0 += point.latitude;
                entry.1 += point.longitude;
                entry.2 += 1;
            }
            Label::Noise | Label::Unvisited => noise.push(*point),
        }
    }

    sums.into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(lat, lon, count)| Cluster {
            centroid: Coordinate {
                latitude: lat / count as f64,
                longitude: lon / count as f64,
            },
            count,
        })
        .chain(noise.into_iter().map(|centroid| Cluster { centroid, count: 1 }))
        .collect()
}
