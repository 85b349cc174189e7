use lazy_static::lazy_static;
use prometheus::IntCounter;
use prometheus::IntGauge;
use prometheus::Registry;

lazy_static! {
    pub static ref EVENTS_POSTED: IntCounter = IntCounter::new(
        "events_posted_total",
        "Events appended to a game history"
    )
    .expect("metric can not be created");

    pub static ref PACKETS_PUBLISHED: IntCounter = IntCounter::new(
        "packets_published_total",
        "Notification packets queued on pub/sub channels"
    )
    .expect("metric can not be created");

    pub static ref OPEN_STREAMS: IntGauge = IntGauge::new(
        "open_client_streams",
        "Live client delivery loops"
    )
    .expect("metric can not be created");

    pub static ref DICE_GENERATED: IntCounter = IntCounter::new(
        "dice_generated_total",
        "Dice produced by the roll engine"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(EVENTS_POSTED.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PACKETS_PUBLISHED.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(OPEN_STREAMS.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(DICE_GENERATED.clone()))
        .expect("collector can be registered");
}
