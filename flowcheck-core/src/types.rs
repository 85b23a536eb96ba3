use serde::{Deserialize, Serialize};

/// The unit flowing through a test pipeline: a data record or the marker
/// that a channel has no more of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StreamElement<T> {
    /// User data record.
    Record(T),
    /// End of a bounded (or stopped) stream.
    End,
}

impl<T> StreamElement<T> {
    /// Create a record element.
    pub fn record(value: T) -> Self {
        Self::Record(value)
    }

    /// Return true if this is the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Trait bound for types that can flow through a test pipeline.
/// All record types under verification must satisfy this.
pub trait StreamData: Send + Clone + Serialize + for<'de> Deserialize<'de> + 'static {}

// Blanket implementation: any type satisfying the bounds is StreamData.
impl<T> StreamData for T where T: Send + Clone + Serialize + for<'de> Deserialize<'de> + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_element_record() {
        let elem = StreamElement::record(42i32);
        match &elem {
            StreamElement::Record(value) => assert_eq!(*value, 42),
            StreamElement::End => panic!("expected Record"),
        }
        assert!(!elem.is_end());
    }

    #[test]
    fn test_stream_element_end() {
        let elem = StreamElement::<i32>::End;
        assert!(elem.is_end());
    }

    #[test]
    fn test_stream_data_trait() {
        // Verify common record types satisfy StreamData.
        fn assert_stream_data<T: StreamData>() {}
        assert_stream_data::<i32>();
        assert_stream_data::<String>();
        assert_stream_data::<(String, i32)>();
        assert_stream_data::<Vec<u8>>();
    }
}
