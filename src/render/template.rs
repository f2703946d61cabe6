use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use tera::{Context, Tera};

use super::error::TemplateRenderError;
use crate::models::{DeviceView, Params, TemplateVariable};

const TEMPLATE_NAME: &str = "dry-run";

/// Tera globals that read the environment, the clock or an RNG
const DISABLED_FUNCTIONS: [&str; 3] = ["get_env", "now", "get_random"];

/// Expand template source against validated params and an optional device.
///
/// The context exposes `params` and `device` (null when no device is given).
/// Undefined variables are errors, never empty strings, and nothing is escaped.
pub fn render_template(
    content: &str,
    params: &Params,
    device: Option<&DeviceView>,
) -> Result<String, TemplateRenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    for name in DISABLED_FUNCTIONS {
        tera.register_function(name, disabled_function(name));
    }
    tera.add_raw_template(TEMPLATE_NAME, content)
        .map_err(|e| render_error("invalid template", &e))?;

    let mut context = Context::new();
    context.insert("params", params);
    match device {
        Some(d) => context.insert("device", d),
        None => context.insert("device", &Value::Null),
    }

    tera.render(TEMPLATE_NAME, &context)
        .map_err(|e| render_error("render failed", &e))
}

/// Output must depend only on the template, params and device
fn disabled_function(
    name: &'static str,
) -> impl Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |_args| {
        Err(tera::Error::msg(format!(
            "function '{}' is not available in configuration templates",
            name
        )))
    }
}

/// Tera keeps the useful detail (missing variable, bad filter) in the source chain
fn render_error(prefix: &str, err: &tera::Error) -> TemplateRenderError {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    TemplateRenderError { message }
}

/// Variables available to template authors
pub fn device_variables() -> Vec<TemplateVariable> {
    vec![
        TemplateVariable { name: "params.<key>".into(), description: "Validated template parameter".into(), example: "{{ params.vlan_id }}".into() },
        TemplateVariable { name: "device.id".into(), description: "Device ID".into(), example: "42".into() },
        TemplateVariable { name: "device.name".into(), description: "Device name".into(), example: "core-sw-01".into() },
        TemplateVariable { name: "device.ip_address".into(), description: "Management IP address".into(), example: "10.0.0.1".into() },
        TemplateVariable { name: "device.vendor".into(), description: "Device vendor / platform".into(), example: "huawei".into() },
        TemplateVariable { name: "device.device_group".into(), description: "Device group (may be null)".into(), example: "campus-core".into() },
        TemplateVariable { name: "device.dept_id".into(), description: "Owning department ID (may be null)".into(), example: "3".into() },
        TemplateVariable { name: "{% if device %}".into(), description: "Guard device-specific lines; device is null in a plain dry-run".into(), example: "{% if device %}sysname {{ device.name }}{% endif %}".into() },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Params {
        match v {
            Value::Object(m) => m,
            _ => panic!("params must be an object"),
        }
    }

    fn device() -> DeviceView {
        DeviceView {
            id: 42,
            name: "core-sw-01".into(),
            ip_address: "10.0.0.1".into(),
            vendor: "huawei".into(),
            device_group: Some("campus".into()),
            dept_id: None,
        }
    }

    #[test]
    fn test_render_params() {
        let out = render_template(
            "interface {{ params.ifname }}\ndescription {{ params.desc }}",
            &params(json!({"ifname": "GigabitEthernet0/1", "desc": "uplink"})),
            None,
        )
        .unwrap();
        assert_eq!(out, "interface GigabitEthernet0/1\ndescription uplink");
    }

    #[test]
    fn test_render_device_context() {
        let out = render_template(
            "sysname {{ device.name }}\n# mgmt {{ device.ip_address }} ({{ device.vendor }})",
            &Params::new(),
            Some(&device()),
        )
        .unwrap();
        assert_eq!(out, "sysname core-sw-01\n# mgmt 10.0.0.1 (huawei)");
    }

    #[test]
    fn test_device_is_null_without_device() {
        let tpl = "{% if device %}sysname {{ device.name }}{% else %}no device{% endif %}";
        assert_eq!(render_template(tpl, &Params::new(), None).unwrap(), "no device");
        assert_eq!(
            render_template(tpl, &Params::new(), Some(&device())).unwrap(),
            "sysname core-sw-01"
        );
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let err = render_template("vlan {{ params.missing }}", &Params::new(), None).unwrap_err();
        assert!(err.message.contains("missing"), "{}", err.message);
    }

    #[test]
    fn test_device_field_without_device_is_error() {
        assert!(render_template("sysname {{ device.name }}", &Params::new(), None).is_err());
    }

    #[test]
    fn test_syntax_error() {
        let err = render_template("{% for x in %}", &Params::new(), None).unwrap_err();
        assert!(err.message.starts_with("invalid template"));
    }

    #[test]
    fn test_no_escaping() {
        let out = render_template(
            "description {{ params.d }}",
            &params(json!({"d": "<a & b> \"q\""})),
            None,
        )
        .unwrap();
        assert_eq!(out, "description <a & b> \"q\"");
    }

    #[test]
    fn test_trailing_newline_preserved() {
        let out = render_template("reload\n", &Params::new(), None).unwrap();
        assert_eq!(out, "reload\n");
    }

    #[test]
    fn test_loops_over_structured_params() {
        let out = render_template(
            "{% for v in params.vlans %}vlan {{ v.id }}\n name {{ v.name }}\n{% endfor %}",
            &params(json!({"vlans": [{"id": 10, "name": "users"}, {"id": 20, "name": "voice"}]})),
            None,
        )
        .unwrap();
        assert_eq!(out, "vlan 10\n name users\nvlan 20\n name voice\n");
    }

    #[test]
    fn test_environment_functions_disabled() {
        std::env::set_var("NETCFG_RENDER_TEST_SECRET", "hunter2");
        let err = render_template(
            "snmp-agent community {{ get_env(name=\"NETCFG_RENDER_TEST_SECRET\") }}",
            &Params::new(),
            None,
        )
        .unwrap_err();
        assert!(!err.message.contains("hunter2"));
        assert!(err.message.contains("get_env"), "{}", err.message);
    }

    #[test]
    fn test_clock_and_random_functions_disabled() {
        for tpl in ["clock {{ now() }}", "rule {{ get_random(end=1000000) }}"] {
            let err = render_template(tpl, &Params::new(), None).unwrap_err();
            assert!(err.message.contains("not available"), "{}", err.message);
        }
    }

    #[test]
    fn test_deterministic() {
        let p = params(json!({"a": 1, "b": "two", "c": [3]}));
        let tpl = "{{ params.a }} {{ params.b }} {{ params.c | first }}";
        let first = render_template(tpl, &p, Some(&device())).unwrap();
        for _ in 0..5 {
            assert_eq!(render_template(tpl, &p, Some(&device())).unwrap(), first);
        }
    }
}
