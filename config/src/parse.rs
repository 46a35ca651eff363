use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Schedule {
    pub(super) bus: Option<Bus>,
    pub(super) transfer: Option<Transfer>,
    pub(super) tasks: Option<Tasks>,
    pub(super) trace: Option<Trace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Unit(pub String);

#[derive(Debug, Default, Deserialize)]
pub struct DirectionName(pub String);

#[derive(Debug, Default, Deserialize)]
pub struct WaitMode(pub String);

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bus {
    pub(super) capacity: Option<i64>,
    pub(super) initial_direction: Option<DirectionName>,
    pub(super) wait: Option<WaitMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Transfer {
    pub(super) time: Option<i64>,
    pub(super) tick: Option<u64>,
    pub(super) unit: Option<Unit>,
    pub(super) seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tasks {
    pub(super) normal_send: Option<i64>,
    pub(super) normal_receive: Option<i64>,
    pub(super) high_send: Option<i64>,
    pub(super) high_receive: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Trace {
    pub(super) enabled: Option<bool>,
}
