use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the keyframe interval found by the previous lookup.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Time-ordered samples for one joint.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn linear(times: Vec<f32>, values: Vec<T>) -> Self {
        Self::new(times, values, InterpolationMode::Linear)
    }

    /// A track holding a single pose for the whole clip.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self::new(vec![0.0], vec![value], InterpolationMode::Linear)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of the last keyframe that has a value.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.len().checked_sub(1).map_or(0.0, |last| self.times[last])
    }

    /// `true` when keyframe times never decrease.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.times.windows(2).all(|w| w[0] <= w[1])
    }

    /// Returns a track with every value passed through `f`, keeping times.
    #[must_use]
    pub fn map_values(&self, f: impl FnMut(&T) -> T) -> Self {
        Self {
            times: self.times.clone(),
            values: self.values.iter().map(f).collect(),
            interpolation: self.interpolation,
        }
    }

    /// Stateless sampling. Returns `None` for an empty track.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // partition_point finds the first index where t > time, i.e. next_index
        let next_idx = self.times[..self.len()].partition_point(|&t| t <= time);
        Some(self.sample_at_frame(next_idx.saturating_sub(1), time))
    }

    /// Sampling with cursor.
    ///
    /// Sequential playback finds its interval in a few steps from the
    /// previous one; large jumps (loop wrap, seeking) fall back to a binary
    /// search. Returns the same values as [`sample`](Self::sample).
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        // Static data (single keyframe)
        if len == 1 {
            return Some(self.values[0]);
        }

        let times = &self.times[..len];
        let i = cursor.last_index.min(len - 1);
        let t_curr = times[i];

        let found_index = if time >= t_curr {
            // Forward playback: scan ahead up to MAX_SCAN_OFFSET intervals.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Reverse playback: scan back.
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let final_index = found_index.unwrap_or_else(|| {
            let next_idx = times.partition_point(|&t| t <= time);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = final_index;

        Some(self.sample_at_frame(final_index, time))
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.len();

        // No next frame available
        if index >= len - 1 {
            return self.values[len - 1];
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };

        // Exact keyframe hits return the stored value untouched.
        if t <= 0.0 {
            return self.values[index];
        }
        if t >= 1.0 {
            return self.values[next_idx];
        }

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                T::interpolate_linear(self.values[index], self.values[next_idx], t)
            }
        }
    }
}
