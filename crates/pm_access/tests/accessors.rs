use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use pm_access::capability::DynPropertyAccess;
use pm_access::{Accessor, AccessorTable, DynAccessor};
use pm_expr::{AnyValue, Lambda, Param, property};
use pm_text::{ConversionError, ConversionRegistry, TextConverter, impl_text_converter};

#[derive(Clone, Debug, Default, PartialEq)]
enum Protocol {
    #[default]
    Icmp,
    Tcp,
}

struct ProtocolText;

impl TextConverter<Protocol> for ProtocolText {
    fn parse(&self, text: &str) -> Result<Protocol, ConversionError> {
        match text.to_ascii_lowercase().as_str() {
            "icmp" => Ok(Protocol::Icmp),
            "tcp" => Ok(Protocol::Tcp),
            _ => Err(ConversionError::parse::<Protocol>(text, "unknown protocol")),
        }
    }

    fn render(&self, value: &Protocol) -> Result<String, ConversionError> {
        Ok(match value {
            Protocol::Icmp => "icmp",
            Protocol::Tcp => "tcp",
        }
        .to_owned())
    }
}

impl_text_converter!(Protocol => ProtocolText);

#[derive(Debug)]
struct Monitor {
    target: SocketAddr,
    count: u32,
    protocol: Protocol,
    label: String,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([127, 0, 0, 1], 7)),
            count: 4,
            protocol: Protocol::default(),
            label: String::new(),
        }
    }
}

fn count_accessor(name: &'static str) -> Accessor<Monitor, u32> {
    let count = property!(Monitor, count: u32).into_ref();
    let param = Param::new::<Monitor>(name);
    Accessor::compile(&Lambda::new([param.clone()], param.member(&count))).unwrap()
}

#[test]
fn typed_boxed_and_text_round_trips() {
    let count = count_accessor("p");
    let mut monitor = Monitor::default();

    count.set(&mut monitor, 10);
    assert_eq!(count.get(&monitor), 10);

    count.set_boxed(&mut monitor, AnyValue::new(11_u32)).unwrap();
    assert_eq!(count.get_boxed(&monitor).take::<u32>().unwrap(), 11);

    count.set_text(&mut monitor, "12").unwrap();
    assert_eq!(count.get_text(&monitor).unwrap(), "12");
    assert_eq!(monitor.count, 12);
}

#[test]
fn accessors_equal_across_parameter_names() {
    let set: HashSet<_> = ["p", "monitor", "x"].into_iter().map(count_accessor).collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn defaulted_text_set() {
    let count = count_accessor("p");
    let mut monitor = Monitor::default();

    count
        .set_text_or_default(&mut monitor, "not-a-number", 5)
        .unwrap();
    assert_eq!(monitor.count, 5);

    let err = count.set_text(&mut monitor, "not-a-number").unwrap_err();
    assert!(err.is_conversion());
    assert!(std::error::Error::source(&err).is_some());
}

#[cfg(feature = "auto_register")]
#[test]
fn auto_registered_converter_reaches_the_global_registry() {
    let protocol = Accessor::from_property(property!(Monitor, protocol: Protocol)).unwrap();
    let mut monitor = Monitor::default();

    protocol.set_text(&mut monitor, "TCP").unwrap();
    assert_eq!(monitor.protocol, Protocol::Tcp);
    assert_eq!(protocol.get_text(&monitor).unwrap(), "tcp");
}

#[test]
fn heterogeneous_table() {
    let table = AccessorTable::new()
        .with(Accessor::from_property(property!(Monitor, target: SocketAddr)).unwrap())
        .with(count_accessor("p"))
        .with(DynAccessor::from_member(property!(Monitor, label: String).into_ref()).unwrap());

    let mut monitor = Monitor::default();
    table
        .load(
            &mut monitor,
            [("target", "10.1.2.3:53"), ("count", "2"), ("label", "dns")],
        )
        .unwrap();

    assert_eq!(monitor.target, SocketAddr::from(([10, 1, 2, 3], 53)));
    assert_eq!(monitor.label, "dns");
    let dumped: Vec<String> = table
        .dump(&monitor)
        .unwrap()
        .into_iter()
        .map(|(name, text)| format!("{name}={text}"))
        .collect();
    assert_eq!(dumped, ["target=10.1.2.3:53", "count=2", "label=dns"]);
}

#[test]
fn erased_collection_of_dyn_accessors() {
    let registry = Arc::new(ConversionRegistry::new());
    let accessors: Vec<Box<dyn DynPropertyAccess>> = vec![
        Box::new(count_accessor("p").with_registry(registry.clone())),
        Box::new(
            DynAccessor::from_member(property!(Monitor, label: String).into_ref())
                .unwrap()
                .with_registry(registry),
        ),
    ];

    let mut monitor = Monitor::default();
    let target: &mut dyn std::any::Any = &mut monitor;
    for accessor in &accessors {
        accessor.set_text_any(target, "7").unwrap();
    }
    assert_eq!(monitor.count, 7);
    assert_eq!(monitor.label, "7");

    let mut wrong = 0_u8;
    let err = accessors[0].set_text_any(&mut wrong, "1").unwrap_err();
    assert_eq!(err.member(), "count");
}
