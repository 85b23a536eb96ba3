use flowcheck_core::types::StreamData;

/// A test input stream of elements of type `T`.
///
/// Created by [`TestHarness::create_dataset`](crate::harness::TestHarness::create_dataset)
/// (or the constructors here), transformed with [`map`](Self::map) /
/// [`filter`](Self::filter) / [`flat_map`](Self::flat_map), and consumed by
/// attaching a verification sink. Streams may be unbounded — pair those with
/// a finish trigger or expect the watchdog to kill the run.
pub struct TestStream<T> {
    pub(crate) source: Box<dyn Iterator<Item = T> + Send>,
}

impl<T> TestStream<T>
where
    T: StreamData,
{
    /// Create a stream that emits the given collection.
    pub fn from_values(values: Vec<T>) -> Self {
        Self {
            source: Box::new(values.into_iter()),
        }
    }

    /// Create a stream from any iterator, including an unbounded one.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Box::new(iter.into_iter()),
        }
    }

    /// Transform every element.
    pub fn map<U, F>(self, f: F) -> TestStream<U>
    where
        U: StreamData,
        F: FnMut(T) -> U + Send + 'static,
    {
        TestStream {
            source: Box::new(self.source.map(f)),
        }
    }

    /// Keep only elements matching the predicate.
    pub fn filter<F>(self, predicate: F) -> TestStream<T>
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        TestStream {
            source: Box::new(self.source.filter(predicate)),
        }
    }

    /// Transform every element into zero or more elements.
    pub fn flat_map<U, I, F>(self, f: F) -> TestStream<U>
    where
        U: StreamData,
        I: IntoIterator<Item = U> + 'static,
        I::IntoIter: Send + 'static,
        F: FnMut(T) -> I + Send + 'static,
    {
        TestStream {
            source: Box::new(self.source.flat_map(f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: StreamData>(stream: TestStream<T>) -> Vec<T> {
        stream.source.collect()
    }

    #[test]
    fn test_from_values() {
        let stream = TestStream::from_values(vec![1i32, 2, 3]);
        assert_eq!(collect(stream), vec![1, 2, 3]);
    }

    #[test]
    fn test_map_filter_chain() {
        let stream = TestStream::from_values((1i32..=10).collect())
            .map(|x| x * x)
            .filter(|sq| *sq > 25);
        assert_eq!(collect(stream), vec![36, 49, 64, 81, 100]);
    }

    #[test]
    fn test_flat_map_tokenizes() {
        let lines = vec!["hello world".to_string(), "hello flowcheck".to_string()];
        let stream = TestStream::from_values(lines).flat_map(|line| {
            line.split_whitespace()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
        });
        assert_eq!(
            collect(stream),
            vec!["hello", "world", "hello", "flowcheck"]
        );
    }

    #[test]
    fn test_from_iter_is_lazy() {
        // An unbounded iterator can be wrapped without being consumed.
        let stream = TestStream::from_iter(0i64..);
        let first: Vec<i64> = stream.source.take(3).collect();
        assert_eq!(first, vec![0, 1, 2]);
    }
}
