use log::debug;

use crate::config::{GenerationMethod, SimulationConfig};
use crate::position::Position;
use crate::random::RandomSource;

/// Spread of the voters around the center of their cluster.
const CLUSTER_SPREAD: f64 = 0.07;

/// Number of bins of the diagnostic histogram.
pub const HISTOGRAM_BINS: usize = 20;

/// The population of voters for one trial.
#[derive(PartialEq, Debug, Clone)]
pub struct Electorate {
    voters: Vec<Position>,
}

impl Electorate {
    /// Generates the voters with the method of the configuration.
    ///
    /// The configuration is expected to be validated: the uniform method assumes one axis.
    pub fn generate(config: &SimulationConfig, rng: &mut RandomSource) -> Electorate {
        let mut voters = match config.method {
            GenerationMethod::Uniform => uniform_voters(config.voters),
            GenerationMethod::Random => random_voters(config.voters, config.axes, rng),
            GenerationMethod::Clustered => {
                clustered_voters(
                config.voters,
                config.axes,
                config.clusters,
                config.show_distribution,
                rng,
            )
            }
        };
        if config.method != GenerationMethod::Uniform {
            normalize(&mut voters, config.axis_decay);
        }
        let electorate = Electorate { voters };
        if config.show_distribution {
            for axis in 0..config.axes {
                debug!(
                    "Electorate: axis {} distribution: {:?}",
                    axis,
                    electorate.histogram(axis)
                );
            }
        }
        electorate
    }

    /// An electorate with fixed positions. Positions are used as given.
    pub fn from_positions(voters: Vec<Position>) -> Electorate {
        Electorate { voters }
    }

    pub fn voters(&self) -> &[Position] {
        &self.voters
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Counts the voters in equal-width bins between the smallest and largest
    /// coordinate of the axis.
    pub fn histogram(&self, axis: usize) -> Vec<usize> {
        let mut bins = vec![0; HISTOGRAM_BINS];
        let (lo, hi) = match axis_range(&self.voters, axis) {
            Some(r) => r,
            None => return bins,
        };
        let width = hi - lo;
        for v in self.voters.iter() {
            let idx = if width > 0.0 {
                (((v.coords()[axis] - lo) / width) * HISTOGRAM_BINS as f64).floor() as usize
            } else {
                0
            };
            bins[idx.min(HISTOGRAM_BINS - 1)] += 1;
        }
        bins
    }
}

fn uniform_voters(count: usize) -> Vec<Position> {
    (0..count)
        .map(|i| Position::on_line((i as f64 + 0.5) / count as f64))
        .collect()
}

fn random_voters(count: usize, axes: usize, rng: &mut RandomSource) -> Vec<Position> {
    (0..count)
        .map(|_| Position::new((0..axes).map(|_| rng.generate()).collect()))
        .collect()
}

/// The seating of the voters along one axis.
#[derive(PartialEq, Debug, Clone)]
struct AxisSeating {
    /// Cluster centers, in increasing order.
    centers: Vec<f64>,
    /// The cluster of each voter.
    clusters: Vec<usize>,
    occupancy: Vec<usize>,
    coords: Vec<f64>,
}

// The first voters each found their own cluster. The following ones pick a cluster
// in proportion to its occupancy.
fn seat_axis(count: usize, clusters: usize, rng: &mut RandomSource) -> AxisSeating {
    let mut centers: Vec<f64> = (0..clusters).map(|_| rng.generate()).collect();
    centers.sort_by(|a, b| a.total_cmp(b));
    let mut occupancy: Vec<usize> = vec![0; clusters];
    let mut seats: Vec<usize> = Vec::with_capacity(count);
    let mut coords: Vec<f64> = Vec::with_capacity(count);

    for seated in 0..count {
        let cluster = if seated < clusters {
            seated
        } else {
            pick_cluster(&occupancy, seated, rng)
        };
        occupancy[cluster] += 1;
        seats.push(cluster);
        coords.push(centers[cluster] + CLUSTER_SPREAD * rng.normal());
    }
    AxisSeating {
        centers,
        clusters: seats,
        occupancy,
        coords,
    }
}

// Seating is done independently on each axis: the cluster of a voter on one
// axis says nothing about its cluster on the next one.
fn clustered_voters(
    count: usize,
    axes: usize,
    clusters: usize,
    show: bool,
    rng: &mut RandomSource,
) -> Vec<Position> {
    let mut voters: Vec<Position> = (0..count).map(|_| Position::new(vec![0.0; axes])).collect();
    for axis in 0..axes {
        let seating = seat_axis(count, clusters, rng);
        for (voter, x) in voters.iter_mut().zip(seating.coords.iter()) {
            voter.coords_mut()[axis] = *x;
        }
        if show {
            debug!(
                "clustered_voters: axis {} centers: {:?} occupancy: {:?}",
                axis, seating.centers, seating.occupancy
            );
        }
    }
    voters
}

// Chooses a cluster with a probability proportional to its current occupancy.
fn pick_cluster(occupancy: &[usize], seated: usize, rng: &mut RandomSource) -> usize {
    let target = rng.generate() * seated as f64;
    let mut cumulative = 0.0;
    for (idx, occ) in occupancy.iter().enumerate() {
        cumulative += *occ as f64;
        if target < cumulative {
            return idx;
        }
    }
    occupancy.len() - 1
}

fn axis_range(voters: &[Position], axis: usize) -> Option<(f64, f64)> {
    let mut it = voters.iter().map(|v| v.coords()[axis]);
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
}

/// Rescales every axis so that its smallest value is 0 and its largest value is the
/// axis weight. The first axis has weight 1, each following axis the weight of the
/// previous one times the decay.
pub fn normalize(voters: &mut [Position], decay: f64) {
    let axes = match voters.first() {
        Some(v) => v.axes(),
        None => return,
    };
    let mut weight = 1.0;
    for axis in 0..axes {
        if let Some((lo, hi)) = axis_range(voters, axis) {
            let width = hi - lo;
            for v in voters.iter_mut() {
                let x = &mut v.coords_mut()[axis];
                *x = if width > 0.0 {
                    ((*x - lo) / width * weight).clamp(0.0, weight)
                } else {
                    0.0
                };
            }
        }
        weight *= decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(method: GenerationMethod, voters: usize, axes: usize) -> SimulationConfig {
        let mut c = SimulationConfig::DEFAULT;
        c.method = method;
        c.voters = voters;
        c.axes = axes;
        c.validate().unwrap()
    }

    #[test]
    fn uniform_is_evenly_spaced() {
        let mut rng = RandomSource::new(1);
        let e = Electorate::generate(&config(GenerationMethod::Uniform, 4, 1), &mut rng);
        let xs: Vec<f64> = e.voters().iter().map(|v| v.primary()).collect();
        assert_eq!(xs, vec![0.125, 0.375, 0.625, 0.875]);
    }

    #[test]
    fn uniform_does_not_draw() {
        let mut r1 = RandomSource::new(5);
        let mut r2 = RandomSource::new(5);
        Electorate::generate(&config(GenerationMethod::Uniform, 10, 1), &mut r1);
        assert_eq!(r1.generate().to_bits(), r2.generate().to_bits());
    }

    #[test]
    fn random_is_normalized_with_decay() {
        let mut rng = RandomSource::new(11);
        let mut c = config(GenerationMethod::Random, 200, 3);
        c.axis_decay = 0.5;
        let e = Electorate::generate(&c, &mut rng);
        let weights = [1.0, 0.5, 0.25];
        for (axis, w) in weights.iter().enumerate() {
            let (lo, hi) = axis_range(e.voters(), axis).unwrap();
            assert_eq!(lo, 0.0);
            assert!((hi - w).abs() < 1e-12, "axis {} max {}", axis, hi);
        }
    }

    #[test]
    fn clustered_is_normalized() {
        let mut rng = RandomSource::new(3);
        let e = Electorate::generate(&config(GenerationMethod::Clustered, 500, 2), &mut rng);
        assert_eq!(e.len(), 500);
        for v in e.voters() {
            assert_eq!(v.axes(), 2);
            assert!((0.0..=1.0).contains(&v.coords()[0]));
            assert!((0.0..=0.5).contains(&v.coords()[1]));
        }
    }

    #[test]
    fn pick_cluster_follows_occupancy() {
        let mut rng = RandomSource::new(8);
        // Only the second cluster is occupied.
        for _ in 0..100 {
            assert_eq!(pick_cluster(&[0, 4, 0], 4, &mut rng), 1);
        }
    }

    #[test]
    fn first_voters_found_the_clusters() {
        let mut rng = RandomSource::new(17);
        let s = seat_axis(60, 4, &mut rng);
        assert_eq!(s.clusters.len(), 60);
        assert_eq!(&s.clusters[..4], &[0, 1, 2, 3]);
        assert!(s.centers.windows(2).all(|w| w[0] <= w[1]));
        for i in 0..4 {
            assert!((s.coords[i] - s.centers[i]).abs() < 10.0 * CLUSTER_SPREAD);
        }
        assert_eq!(s.occupancy.iter().sum::<usize>(), 60);
        assert!(s.occupancy.iter().all(|n| *n >= 1));
        for (cluster, n) in s.occupancy.iter().enumerate() {
            assert_eq!(s.clusters.iter().filter(|c| **c == cluster).count(), *n);
        }

        // As many voters as clusters: one founder each.
        let s = seat_axis(3, 3, &mut rng);
        assert_eq!(s.clusters, vec![0, 1, 2]);
        assert_eq!(s.occupancy, vec![1, 1, 1]);
    }

    #[test]
    fn clustered_voters_use_the_seating() {
        let mut r1 = RandomSource::new(23);
        let mut r2 = RandomSource::new(23);
        let voters = clustered_voters(30, 2, 3, false, &mut r1);
        let first = seat_axis(30, 3, &mut r2);
        let second = seat_axis(30, 3, &mut r2);
        for (idx, v) in voters.iter().enumerate() {
            assert_eq!(v.coords(), &[first.coords[idx], second.coords[idx]][..]);
        }
    }

    #[test]
    fn histogram_counts_everyone() {
        let mut rng = RandomSource::new(1);
        let e = Electorate::generate(&config(GenerationMethod::Uniform, 40, 1), &mut rng);
        let h = e.histogram(0);
        assert_eq!(h.len(), HISTOGRAM_BINS);
        assert_eq!(h.iter().sum::<usize>(), 40);
        assert!(h.iter().all(|c| (1..=3).contains(c)));
    }
}
