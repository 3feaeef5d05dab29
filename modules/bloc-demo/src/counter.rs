//! Counter domain: the events, the state, and the mapping between them.

use bloc_core::{Bloc, BlocConfig, BlocError, Event};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterEvent {
    Increment,
    Decrement,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterState {
    pub value: i64,
    pub events_seen: u64,
    /// Millisecond timestamp of the event that produced this state.
    pub updated_at: i64,
}

/// Context data owned by the bloc.
#[derive(Debug, Default)]
pub struct Tally {
    pub value: i64,
    pub events_seen: u64,
}

pub fn map_event_to_state(event: &Event<CounterEvent>, tally: &mut Tally) -> CounterState {
    match event.payload() {
        CounterEvent::Increment => tally.value += 1,
        CounterEvent::Decrement => tally.value -= 1,
        CounterEvent::Reset => tally.value = 0,
    }
    tally.events_seen += 1;

    CounterState {
        value: tally.value,
        events_seen: tally.events_seen,
        updated_at: event.timestamp_millis(),
    }
}

pub fn counter_bloc(config: BlocConfig) -> Result<Bloc<CounterEvent, CounterState, Tally>, BlocError> {
    Bloc::with_config(config, Tally::default(), map_event_to_state)
}

pub fn render(state: &CounterState) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| state.value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_tracks_value_and_event_count() {
        let mut tally = Tally::default();

        let up = map_event_to_state(&Event::new(CounterEvent::Increment), &mut tally);
        assert_eq!((up.value, up.events_seen), (1, 1));

        map_event_to_state(&Event::new(CounterEvent::Increment), &mut tally);
        let down = map_event_to_state(&Event::new(CounterEvent::Decrement), &mut tally);
        assert_eq!((down.value, down.events_seen), (1, 3));

        let reset = map_event_to_state(&Event::new(CounterEvent::Reset), &mut tally);
        assert_eq!((reset.value, reset.events_seen), (0, 4));
    }

    #[test]
    fn render_is_json() {
        let rendered = render(&CounterState {
            value: 3,
            events_seen: 5,
            updated_at: 10,
        });
        assert_eq!(rendered, r#"{"value":3,"events_seen":5,"updated_at":10}"#);
    }

    #[tokio::test]
    async fn bloc_counts_through_the_pipeline() {
        let bloc = counter_bloc(BlocConfig::default()).unwrap();
        bloc.start_listen_to_event_stream().unwrap();

        bloc.add_event(CounterEvent::Increment).await.unwrap();
        bloc.add_event(CounterEvent::Increment).await.unwrap();

        let latest = bloc.state_history().pop().unwrap();
        assert_eq!(latest.value, 2);
        assert_eq!(bloc.inspect_context(|tally| tally.events_seen), 2);
        bloc.dispose().unwrap();
    }
}
