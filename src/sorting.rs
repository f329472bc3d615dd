use serde::{Deserialize, Serialize};

use crate::catalog::Algorithm;
use crate::config;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{Outcome, Run, Step, StepKind, WorkingState};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum SortKind {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
    Heap,
}

impl SortKind {
    pub const ALL: [SortKind; 6] = [
        SortKind::Bubble,
        SortKind::Selection,
        SortKind::Insertion,
        SortKind::Merge,
        SortKind::Quick,
        SortKind::Heap,
    ];

    pub fn algorithm(&self) -> Algorithm {
        match self {
            SortKind::Bubble => Algorithm::BubbleSort,
            SortKind::Selection => Algorithm::SelectionSort,
            SortKind::Insertion => Algorithm::InsertionSort,
            SortKind::Merge => Algorithm::MergeSort,
            SortKind::Quick => Algorithm::QuickSort,
            SortKind::Heap => Algorithm::HeapSort,
        }
    }
}

/// Working array plus origin tags, driving the recorder as it is mutated.
///
/// `origin[i]` is the input position of the value now at `i`; the tags
/// travel with every swap and assignment.
struct Sorter<'r, 'a> {
    arr: Vec<i64>,
    origin: Vec<usize>,
    rec: &'r mut StepRecorder<'a>,
}

impl<'r, 'a> Sorter<'r, 'a> {
    fn new(input: &[i64], rec: &'r mut StepRecorder<'a>) -> Self {
        Sorter {
            arr: input.to_vec(),
            origin: (0..input.len()).collect(),
            rec,
        }
    }

    fn state(&self) -> WorkingState {
        WorkingState::Array(self.arr.clone())
    }

    fn compare(&mut self, i: usize, j: usize, result: bool, op: &str) -> Result<bool> {
        self.rec.checkpoint()?;
        let (a, b) = (self.arr[i], self.arr[j]);
        let step = Step::new(StepKind::Compare, self.state())
            .keys([i, j])
            .value("left", a)
            .value("right", b)
            .value("result", result)
            .note(format!("{} {} {}", a, op, b));
        self.rec.record(step);
        Ok(result)
    }

    fn greater(&mut self, i: usize, j: usize) -> Result<bool> {
        let result = self.arr[i] > self.arr[j];
        self.compare(i, j, result, ">")
    }

    fn less(&mut self, i: usize, j: usize) -> Result<bool> {
        let result = self.arr[i] < self.arr[j];
        self.compare(i, j, result, "<")
    }

    fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        self.rec.checkpoint()?;
        self.arr.swap(i, j);
        self.origin.swap(i, j);
        let step = Step::new(StepKind::Swap, self.state())
            .keys([i, j])
            .note(format!("swap [{}] and [{}]", i, j));
        self.rec.record(step);
        Ok(())
    }

    fn assign(&mut self, k: usize, value: i64, origin: usize) -> Result<()> {
        self.rec.checkpoint()?;
        self.arr[k] = value;
        self.origin[k] = origin;
        let step = Step::new(StepKind::Assign, self.state())
            .key(k)
            .value("value", value)
            .note(format!("[{}] = {}", k, value));
        self.rec.record(step);
        Ok(())
    }

    fn mark(&mut self, i: usize) -> Result<()> {
        self.rec.checkpoint()?;
        let step = Step::new(StepKind::MarkSorted, self.state())
            .key(i)
            .note(format!("[{}] in final position", i));
        self.rec.record(step);
        Ok(())
    }

    fn mark_range(&mut self, lo: usize, hi: usize) -> Result<()> {
        for i in lo..hi {
            self.mark(i)?;
        }
        Ok(())
    }

    fn bubble(&mut self) -> Result<()> {
        let n = self.arr.len();
        for i in 0..n - 1 {
            for j in 0..n - 1 - i {
                if self.greater(j, j + 1)? {
                    self.swap(j, j + 1)?;
                }
            }
            self.mark(n - 1 - i)?;
        }
        self.mark(0)
    }

    fn selection(&mut self) -> Result<()> {
        let n = self.arr.len();
        for i in 0..n - 1 {
            let mut min = i;
            for j in i + 1..n {
                if self.less(j, min)? {
                    min = j;
                }
            }
            if min != i {
                self.swap(i, min)?;
            }
            self.mark(i)?;
        }
        self.mark(n - 1)
    }

    fn insertion(&mut self) -> Result<()> {
        let n = self.arr.len();
        for i in 1..n {
            let key = self.arr[i];
            let key_origin = self.origin[i];
            let mut j = i;
            // The key lives outside the array while larger values shift right.
            while j > 0 {
                self.rec.checkpoint()?;
                let result = self.arr[j - 1] > key;
                let step = Step::new(StepKind::Compare, self.state())
                    .keys([j - 1, i])
                    .value("left", self.arr[j - 1])
                    .value("right", key)
                    .value("result", result)
                    .note(format!("{} > key {}", self.arr[j - 1], key));
                self.rec.record(step);
                if !result {
                    break;
                }
                let shifted = self.arr[j - 1];
                let shifted_origin = self.origin[j - 1];
                self.assign(j, shifted, shifted_origin)?;
                j -= 1;
            }
            self.assign(j, key, key_origin)?;
        }
        self.mark_range(0, n)
    }

    fn merge_sort(&mut self, lo: usize, hi: usize) -> Result<()> {
        if hi - lo <= 1 {
            return Ok(());
        }
        let mid = lo + (hi - lo) / 2;
        self.merge_sort(lo, mid)?;
        self.merge_sort(mid, hi)?;
        self.merge(lo, mid, hi)
    }

    fn merge(&mut self, lo: usize, mid: usize, hi: usize) -> Result<()> {
        let left: Vec<(i64, usize)> = (lo..mid).map(|i| (self.arr[i], self.origin[i])).collect();
        let right: Vec<(i64, usize)> = (mid..hi).map(|i| (self.arr[i], self.origin[i])).collect();
        let (mut i, mut j, mut k) = (0, 0, lo);

        while i < left.len() && j < right.len() {
            self.rec.checkpoint()?;
            // `<=` keeps equal keys in left-run order.
            let take_left = left[i].0 <= right[j].0;
            let step = Step::new(StepKind::Compare, self.state())
                .keys([lo + i, mid + j])
                .value("left", left[i].0)
                .value("right", right[j].0)
                .value("result", take_left)
                .note(format!("{} <= {}", left[i].0, right[j].0));
            self.rec.record(step);

            let (value, origin) = if take_left {
                i += 1;
                left[i - 1]
            } else {
                j += 1;
                right[j - 1]
            };
            self.assign(k, value, origin)?;
            k += 1;
        }
        for &(value, origin) in left[i..].iter().chain(right[j..].iter()) {
            self.assign(k, value, origin)?;
            k += 1;
        }
        Ok(())
    }

    fn quick(&mut self, lo: usize, hi: usize) -> Result<()> {
        if lo > hi {
            return Ok(());
        }
        if lo == hi {
            return self.mark(lo);
        }
        let p = self.partition(lo, hi)?;
        if p > lo {
            self.quick(lo, p - 1)?;
        }
        self.quick(p + 1, hi)
    }

    /// Lomuto partition around `arr[hi]`.
    fn partition(&mut self, lo: usize, hi: usize) -> Result<usize> {
        let mut store = lo;
        for j in lo..hi {
            if self.less(j, hi)? {
                self.swap(store, j)?;
                store += 1;
            }
        }
        self.swap(store, hi)?;
        self.mark(store)?;
        Ok(store)
    }

    fn heap(&mut self) -> Result<()> {
        let n = self.arr.len();
        for i in (0..n / 2).rev() {
            self.sift_down(i, n)?;
        }
        for end in (1..n).rev() {
            self.swap(0, end)?;
            self.mark(end)?;
            self.sift_down(0, end)?;
        }
        self.mark(0)
    }

    fn sift_down(&mut self, mut i: usize, n: usize) -> Result<()> {
        loop {
            let mut largest = i;
            let (l, r) = (2 * i + 1, 2 * i + 2);
            if l < n && self.greater(l, largest)? {
                largest = l;
            }
            if r < n && self.greater(r, largest)? {
                largest = r;
            }
            if largest == i {
                return Ok(());
            }
            self.swap(i, largest)?;
            i = largest;
        }
    }

    fn run(&mut self, kind: SortKind) -> Result<()> {
        let n = self.arr.len();
        match kind {
            SortKind::Bubble => self.bubble(),
            SortKind::Selection => self.selection(),
            SortKind::Insertion => self.insertion(),
            SortKind::Merge => {
                self.merge_sort(0, n)?;
                self.mark_range(0, n)
            }
            SortKind::Quick => self.quick(0, n - 1),
            SortKind::Heap => self.heap(),
        }
    }
}

pub fn sort(kind: SortKind, input: &[i64]) -> Result<Run> {
    sort_with(kind, input, &mut StepRecorder::new())
}

pub fn sort_with(kind: SortKind, input: &[i64], rec: &mut StepRecorder) -> Result<Run> {
    if input.is_empty() {
        return Err(VizError::invalid("array is empty"));
    }
    config::check_len(input.len(), "array")?;
    let mut sorter = Sorter::new(input, rec);
    sorter.run(kind)?;
    let sorted = sorter.arr;

    let steps = rec.take_steps();
    log::debug!("{:?} sort of {} values: {} steps", kind, input.len(), steps.len());
    Ok(Run {
        algorithm: kind.algorithm(),
        initial: WorkingState::Array(input.to_vec()),
        steps,
        final_state: WorkingState::Array(sorted.clone()),
        outcome: Outcome::Sorted(sorted),
    })
}

/// Input positions of the values in merge-sorted order.
///
/// For equal values the positions ascend, which is what stability means.
pub fn merge_sort_permutation(input: &[i64]) -> Result<Vec<usize>> {
    if input.is_empty() {
        return Err(VizError::invalid("array is empty"));
    }
    config::check_len(input.len(), "array")?;
    let mut rec = StepRecorder::new();
    let mut sorter = Sorter::new(input, &mut rec);
    sorter.merge_sort(0, input.len())?;
    Ok(sorter.origin)
}
