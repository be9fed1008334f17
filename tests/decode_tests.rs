use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::sync::Arc;
use xmlrpc_serde::{
    CodecConfig, Error, Fault, Handler, Iso8601, MethodRegistry, RecordDescriptor, Response,
    TypeDescriptor, Value, XmlRpcType, decode, decode_response_slice, decode_slice,
    decode_with_config, encode_fault, from_value, invoke, invoke_and_encode,
};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

impl XmlRpcType for Point {
    fn descriptor() -> TypeDescriptor {
        RecordDescriptor::of::<Point>("Point")
            .field::<i32>("x")
            .field::<i32>("y")
            .into()
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Account {
    id: i32,
    #[serde(rename = "displayName")]
    display_name: String,
}

impl XmlRpcType for Account {
    fn descriptor() -> TypeDescriptor {
        RecordDescriptor::of::<Account>("Account")
            .field::<i32>("id")
            .read_only()
            .field::<String>("display_name")
            .rename("displayName")
            .into()
    }
}

fn registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry
        .register_fn("echo", |(s,): (String,)| Ok(s))
        .unwrap()
        .register_fn("add", |(a, b): (i32, i32)| Ok(a + b))
        .unwrap()
        .register_fn("half", |(d,): (f64,)| Ok(d / 2.0))
        .unwrap()
        .register_fn("ping", |(): ()| Ok(true))
        .unwrap()
        .register_fn("norm1", |(p,): (Point,)| Ok(p.x.abs() + p.y.abs()))
        .unwrap()
        .register_fn("rename", |(a,): (Account,)| Ok(a.display_name))
        .unwrap()
        .register_fn("sum", |(xs,): (Vec<i32>,)| Ok(xs.iter().sum::<i32>()))
        .unwrap()
        .register_fn("pair", |(xs,): ([i32; 2],)| Ok(xs[0] * xs[1]))
        .unwrap()
        .register_fn("flag", |(b,): (bool,)| Ok(!b))
        .unwrap()
        .register_fn("size", |(b,): (ByteBuf,)| Ok(b.len() as i32))
        .unwrap()
        .register_fn("year", |(d,): (Iso8601,)| Ok(d.0.format("%Y").to_string()))
        .unwrap()
        .register_fn("anything", |(v,): (Value,)| Ok(v))
        .unwrap()
        .register_fn("nothing", |(): ()| Ok(Option::<i32>::None))
        .unwrap()
        .register_fn("refuse", |(): ()| -> xmlrpc_serde::Result<i32> {
            Err(Error::application("not today"))
        })
        .unwrap()
        .register_fn("explode", |(): ()| -> xmlrpc_serde::Result<i32> {
            Err(Error::handler(std::io::Error::other("secret detail")))
        })
        .unwrap()
        .register_async("later", |(n,): (i32,)| async move { Ok::<_, Error>(n * 10) })
        .unwrap();
    registry
}

fn call(method: &str, params: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>{}</methodName><params>{}</params></methodCall>",
        method, params
    )
}

fn param(value: &str) -> String {
    format!("<param><value>{}</value></param>", value)
}

fn decode_err(xml: &str) -> Error {
    decode_slice(xml.as_bytes(), &registry()).unwrap_err()
}

// ── Successful decoding ────────────────────────────────────────────────────

#[test]
fn test_decode_string_param() {
    let call = decode_slice(call("echo", &param("<string>hi</string>")).as_bytes(), &registry())
        .unwrap();
    assert_eq!(call.name(), "echo");
    assert_eq!(call.params, vec![Value::String("hi".into())]);
}

#[test]
fn test_bare_value_is_string() {
    let call = decode_slice(call("echo", &param("plain text")).as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::String("plain text".into())]);
}

#[test]
fn test_whitespace_only_string_is_empty() {
    let call = decode_slice(call("echo", &param("<string>   </string>")).as_bytes(), &registry())
        .unwrap();
    assert_eq!(call.params, vec![Value::String(String::new())]);
}

#[test]
fn test_escaped_text_and_cdata() {
    let xml = call("echo", &param("<string>a &amp; b <![CDATA[<c>]]></string>"));
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::String("a & b <c>".into())]);
}

#[test]
fn test_int_and_i4_tags() {
    let xml = call("add", &(param("<i4>2</i4>") + &param("<int> 40 </int>")));
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::Int(2), Value::Int(40)]);
}

#[test]
fn test_pretty_printed_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- a comment -->
<methodCall>
  <methodName>add</methodName>
  <params>
    <param>
      <value><i4>1</i4></value>
    </param>
    <param>
      <value>
        <i4>2</i4>
      </value>
    </param>
  </params>
</methodCall>
"#;
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_nullary_method_without_params_element() {
    let xml = "<methodCall><methodName>ping</methodName></methodCall>";
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert!(call.params.is_empty());
}

#[test]
fn test_boolean_forms() {
    for (text, expected) in [("1", true), ("0", false), ("true", true), ("FALSE", false)] {
        let xml = call("flag", &param(&format!("<boolean>{}</boolean>", text)));
        let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
        assert_eq!(call.params, vec![Value::Boolean(expected)], "form {:?}", text);
    }
}

#[test]
fn test_base64_with_whitespace() {
    let xml = call("size", &param("<base64>\n  aGVs\n  bG8=\n</base64>"));
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::Base64(b"hello".to_vec())]);
}

#[test]
fn test_compact_datetime() {
    let xml = call("year", &param("<dateTime.iso8601>20170531T05:06:00</dateTime.iso8601>"));
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    let Value::DateTime(dt) = &call.params[0] else {
        panic!("expected a date-time, got {:?}", call.params[0]);
    };
    assert_eq!(dt.to_string(), "2017-05-31 05:06:00");
}

#[test]
fn test_struct_binds_with_defaults() {
    let xml = call(
        "norm1",
        &param("<struct><member><name>x</name><value><i4>5</i4></value></member></struct>"),
    );
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    let point: Point = from_value(call.params[0].clone()).unwrap();
    assert_eq!(point, Point { x: 5, y: 0 });
}

#[test]
fn test_struct_member_rename() {
    let xml = call(
        "rename",
        &param(
            "<struct><member><name>displayName</name>\
             <value><string>Ada</string></value></member></struct>",
        ),
    );
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    let account: Account = from_value(call.params[0].clone()).unwrap();
    assert_eq!(account.display_name, "Ada");
    assert_eq!(account.id, 0);
}

#[test]
fn test_empty_member_value_keeps_default() {
    let xml = call(
        "norm1",
        &param(
            "<struct><member><name>x</name><value></value></member>\
             <member><name>y</name><value><i4>3</i4></value></member></struct>",
        ),
    );
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    let point: Point = from_value(call.params[0].clone()).unwrap();
    assert_eq!(point, Point { x: 0, y: 3 });
}

#[test]
fn test_array_param() {
    let xml = call(
        "sum",
        &param("<array><data><value><i4>1</i4></value><value><i4>2</i4></value></data></array>"),
    );
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(
        call.params,
        vec![Value::Array(vec![Value::Int(1), Value::Int(2)])]
    );
}

#[test]
fn test_empty_array_element_is_skipped() {
    let xml = call(
        "sum",
        &param("<array><data><value><i4>1</i4></value><value/><value><i4>2</i4></value></data></array>"),
    );
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(
        call.params,
        vec![Value::Array(vec![Value::Int(1), Value::Int(2)])]
    );
}

#[test]
fn test_fixed_array_exact_length() {
    let xml = call(
        "pair",
        &param("<array><data><value><i4>3</i4></value><value><i4>4</i4></value></data></array>"),
    );
    assert!(decode_slice(xml.as_bytes(), &registry()).is_ok());
}

#[test]
fn test_any_param_accepts_scalars() {
    let xml = call("anything", &param("<double>2.5</double>"));
    let call = decode_slice(xml.as_bytes(), &registry()).unwrap();
    assert_eq!(call.params, vec![Value::Double(2.5)]);
}

// ── Failures ───────────────────────────────────────────────────────────────

#[test]
fn test_unknown_method() {
    let err = decode_err(&call("nope", ""));
    assert!(matches!(err, Error::MethodNotFound(ref name) if name == "nope"));
    assert_eq!(err.fault_code(), Some(-32601));
}

#[test]
fn test_too_many_params() {
    let err = decode_err(&call("echo", &(param("a") + &param("b"))));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32602));
}

#[test]
fn test_too_few_params() {
    let err = decode_err(&call("add", &param("<i4>1</i4>")));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_missing_params_element_for_non_nullary() {
    let err = decode_err("<methodCall><methodName>echo</methodName></methodCall>");
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_empty_param_value() {
    let err = decode_err(&call("echo", "<param><value></value></param>"));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_param_kind_mismatch() {
    let err = decode_err(&call("echo", &param("<i4>1</i4>")));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_int_does_not_widen_to_double() {
    let err = decode_err(&call("half", &param("<i4>1</i4>")));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_array_element_mismatch() {
    let err = decode_err(&call(
        "sum",
        &param("<array><data><value><string>x</string></value></data></array>"),
    ));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_fixed_array_wrong_length() {
    let err = decode_err(&call(
        "pair",
        &param(
            "<array><data><value><i4>1</i4></value><value><i4>2</i4></value>\
             <value><i4>3</i4></value></data></array>",
        ),
    ));
    assert!(matches!(err, Error::InvalidParams(_)), "{:?}", err);
}

#[test]
fn test_unknown_member_is_internal() {
    let err = decode_err(&call(
        "norm1",
        &param("<struct><member><name>z</name><value><i4>1</i4></value></member></struct>"),
    ));
    assert!(matches!(err, Error::Internal(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32603));
}

#[test]
fn test_read_only_member_is_internal() {
    let err = decode_err(&call(
        "rename",
        &param("<struct><member><name>id</name><value><i4>9</i4></value></member></struct>"),
    ));
    assert!(matches!(err, Error::Internal(_)), "{:?}", err);
}

#[test]
fn test_struct_needs_concrete_record() {
    let err = decode_err(&call("anything", &param("<struct></struct>")));
    assert!(matches!(err, Error::Internal(_)), "{:?}", err);
}

#[test]
fn test_member_value_before_name() {
    let err = decode_err(&call(
        "norm1",
        &param("<struct><member><value><i4>1</i4></value><name>x</name></member></struct>"),
    ));
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_unparsable_scalars() {
    for (method, value) in [
        ("add", "<i4>one</i4>"),
        ("add", "<i4>99999999999</i4>"),
        ("flag", "<boolean>yes</boolean>"),
        ("half", "<double>fast</double>"),
        ("size", "<base64>!!!</base64>"),
        ("year", "<dateTime.iso8601>soon</dateTime.iso8601>"),
    ] {
        let err = decode_err(&call(method, &param(value)));
        assert!(matches!(err, Error::InvalidXmlRpc(_)), "{} -> {:?}", value, err);
    }
}

#[test]
fn test_unknown_element() {
    let err = decode_err(&call("echo", &param("<nil/>")));
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_element_out_of_place() {
    let err = decode_err("<methodCall><value>x</value></methodCall>");
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_params_before_method_name() {
    let err = decode_err("<methodCall><params></params><methodName>echo</methodName></methodCall>");
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_mixed_content_in_value() {
    let err = decode_err(&call("echo", &param("abc<string>x</string>")));
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_response_document_rejected_as_call() {
    let err = decode_err("<methodResponse><params></params></methodResponse>");
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_empty_document() {
    let err = decode_err("");
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_mismatched_tags() {
    let err = decode_err("<methodCall><methodName>echo</methodCall>");
    assert!(matches!(err, Error::NotWellFormed(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32700));
}

#[test]
fn test_unsupported_encoding() {
    let err = decode_err(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
         <methodCall><methodName>ping</methodName></methodCall>",
    );
    assert!(matches!(err, Error::UnsupportedEncoding(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32701));
}

#[test]
fn test_invalid_utf8() {
    let mut xml = b"<methodCall><methodName>echo</methodName><params><param><value><string>".to_vec();
    xml.extend_from_slice(&[0xff, 0xfe]);
    xml.extend_from_slice(b"</string></value></param></params></methodCall>");
    let err = decode_slice(&xml, &registry()).unwrap_err();
    assert!(matches!(err, Error::InvalidCharacterForEncoding(_)), "{:?}", err);
}

#[test]
fn test_truncated_input_is_transport_error() {
    let err = decode_err("<methodCall><methodName>echo</methodName><params>");
    assert!(matches!(err, Error::Transport(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32300));

    for cut in [
        "<methodCall><methodName>echo</methodName><params><param><val",
        "<methodCall><methodName>echo</methodName><params></para",
        "<methodCall><methodName>echo</methodName><!-- unfinished",
        "<methodCall><methodName>echo</methodName><params><param><value><string><![CDATA[hi",
    ] {
        let err = decode_err(cut);
        assert!(matches!(err, Error::Transport(_)), "{} -> {:?}", cut, err);
    }
}

#[tokio::test]
async fn test_async_truncated_mid_tag_is_transport_error() {
    let xml = "<methodCall><methodName>add</methodName><params><param><value><i4";
    let err = decode(xml.as_bytes(), &registry()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{:?}", err);
    assert_eq!(err.fault_code(), Some(-32300));
}

#[test]
fn test_unfinished_root_tag_is_not_well_formed() {
    let err = decode_err("<methodCa");
    assert!(matches!(err, Error::NotWellFormed(_)), "{:?}", err);
}

#[test]
fn test_content_after_root() {
    let err = decode_err(
        "<methodCall><methodName>ping</methodName></methodCall>\
         <methodCall><methodName>ping</methodName></methodCall>",
    );
    assert!(matches!(err, Error::NotWellFormed(_)), "{:?}", err);
}

// ── Responses ──────────────────────────────────────────────────────────────

#[test]
fn test_response_with_two_params() {
    let xml = "<methodResponse><params>\
               <param><value><i4>1</i4></value></param>\
               <param><value><i4>2</i4></value></param>\
               </params></methodResponse>";
    let err = decode_response_slice(xml.as_bytes(), &i32::descriptor()).unwrap_err();
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);
}

#[test]
fn test_response_struct_result() {
    let xml = "<methodResponse><params><param><value><struct>\
               <member><name>y</name><value><i4>2</i4></value></member>\
               </struct></value></param></params></methodResponse>";
    let response = decode_response_slice(xml.as_bytes(), &Point::descriptor()).unwrap();
    let Response::Success(Some(value)) = response else {
        panic!("expected a value, got {:?}", response);
    };
    assert_eq!(from_value::<Point>(value).unwrap(), Point { x: 0, y: 2 });
}

// ── Async decoding and the request pipeline ────────────────────────────────

#[tokio::test]
async fn test_async_decode() {
    let registry = registry();
    let xml = call("add", &(param("<i4>2</i4>") + &param("<i4>3</i4>")));
    let call = decode(xml.as_bytes(), &registry).await.unwrap();
    assert_eq!(call.params, vec![Value::Int(2), Value::Int(3)]);
    assert_eq!(invoke(&call.method, call.params.clone()).await.unwrap(), Value::Int(5));
}

#[tokio::test]
async fn test_max_depth() {
    let registry = registry();
    let xml = call(
        "sum",
        &param("<array><data><value><i4>1</i4></value></data></array>"),
    );
    let shallow = CodecConfig::default().with_max_depth(5);
    let err = decode_with_config(xml.as_bytes(), &registry, &shallow)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidXmlRpc(_)), "{:?}", err);

    let deep_enough = CodecConfig::default().with_max_depth(9);
    assert!(decode_with_config(xml.as_bytes(), &registry, &deep_enough).await.is_ok());
}

#[tokio::test]
async fn test_respond_echo() {
    let handler = Handler::with_config(
        Arc::new(registry()),
        CodecConfig::default().without_declaration(),
    );
    let request = call("echo", &param("<string>hi</string>"));
    let mut out = Vec::new();
    handler.respond(request.as_bytes(), &mut out).await.unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<methodResponse><params><param><value><string>hi</string></value></param></params></methodResponse>"
    );
}

#[tokio::test]
async fn test_respond_deferred_handler() {
    let handler = Handler::new(Arc::new(registry()));
    let request = call("later", &param("<i4>4</i4>"));
    let mut out = Vec::new();
    handler.respond(request.as_bytes(), &mut out).await.unwrap();
    let response = decode_response_slice(&out, &i32::descriptor()).unwrap();
    assert_eq!(response, Response::Success(Some(Value::Int(40))));
}

async fn fault_for(request: &str) -> Fault {
    let handler = Handler::new(Arc::new(registry()));
    let mut out = Vec::new();
    handler.respond(request.as_bytes(), &mut out).await.unwrap();
    match decode_response_slice(&out, &i32::descriptor()).unwrap() {
        Response::Fault(fault) => fault,
        other => panic!("expected a fault, got {:?}", other),
    }
}

#[tokio::test]
async fn test_respond_faults() {
    assert_eq!(fault_for(&call("nope", "")).await.code, -32601);
    assert_eq!(fault_for(&call("echo", "")).await.code, -32602);
    assert_eq!(fault_for("<methodCall><oops/></methodCall>").await.code, -32600);
    assert_eq!(fault_for("<methodCall>").await.code, -32300);
    assert_eq!(fault_for("<methodCall></wrong>").await.code, -32700);
}

#[tokio::test]
async fn test_respond_application_fault() {
    assert_eq!(
        fault_for(&call("refuse", "")).await,
        Fault::new(-32500, "not today")
    );
}

#[tokio::test]
async fn test_respond_hides_handler_details() {
    assert_eq!(
        fault_for(&call("explode", "")).await,
        Fault::new(500, "Internal Server Error")
    );
}

#[tokio::test]
async fn test_respond_null_result() {
    assert_eq!(fault_for(&call("nothing", "")).await.code, -32603);
}

#[tokio::test]
async fn test_invoke_and_encode() {
    let registry = registry();
    let method = registry.lookup("later").unwrap();
    let mut out = Vec::new();
    invoke_and_encode(&method, vec![Value::Int(2)], &mut out)
        .await
        .unwrap();
    let response = decode_response_slice(&out, &i32::descriptor()).unwrap();
    assert_eq!(response, Response::Success(Some(Value::Int(20))));
}

#[tokio::test]
async fn test_encode_fault() {
    let mut out = Vec::new();
    encode_fault(4, "Too many parameters.", &mut out).await.unwrap();
    let response = decode_response_slice(&out, &Value::descriptor()).unwrap();
    assert_eq!(response, Response::Fault(Fault::new(4, "Too many parameters.")));
}

#[tokio::test]
async fn test_echo_int_scenario() {
    let mut registry = MethodRegistry::new();
    registry.register_fn("echo", |(n,): (i32,)| Ok(n)).unwrap();
    let config = CodecConfig::default().without_declaration();

    let request = "<methodCall><methodName>echo</methodName><params>\
                   <param><value><i4>42</i4></value></param></params></methodCall>";
    let call = decode_slice(request.as_bytes(), &registry).unwrap();
    assert_eq!(call.params, vec![Value::Int(42)]);

    let mut out = Vec::new();
    xmlrpc_serde::respond(request.as_bytes(), &mut out, &registry, &config)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<methodResponse><params><param><value><i4>42</i4></value></param></params></methodResponse>"
    );
}

#[test]
fn test_scalar_round_trip() {
    let registry = registry();
    let values = [
        Value::Int(i32::MIN),
        Value::Boolean(false),
        Value::String("tabs\tand <tags> & \"quotes\"".into()),
        Value::Double(0.1),
        Value::Double(-1e300),
        Value::DateTime(
            chrono::NaiveDateTime::parse_from_str("1999-12-31T23:59:59", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
        ),
        Value::Base64((0..=255).collect()),
    ];
    for value in values {
        let mut encoder = xmlrpc_serde::Encoder::new(Vec::new());
        encoder.write_call("anything", std::slice::from_ref(&value)).unwrap();
        let xml = encoder.into_inner();
        let call = decode_slice(&xml, &registry).unwrap();
        assert_eq!(call.params, vec![value]);
    }
}

#[tokio::test]
async fn test_datetime_return_and_param_round_trip() {
    let when = Iso8601(
        chrono::NaiveDateTime::parse_from_str("2020-01-02T03:04:05", "%Y-%m-%dT%H:%M:%S").unwrap(),
    );
    let mut registry = MethodRegistry::new();
    registry
        .register_fn("now", move |(): ()| Ok(when))
        .unwrap()
        .register_fn("same", |(d,): (Iso8601,)| Ok(d))
        .unwrap();
    assert!(matches!(
        registry.lookup("now").unwrap().returns(),
        TypeDescriptor::DateTime
    ));

    let handler = Handler::with_config(
        Arc::new(registry),
        CodecConfig::default().without_declaration(),
    );
    let mut out = Vec::new();
    handler
        .respond(call("now", "").as_bytes(), &mut out)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<methodResponse><params><param><value>\
         <dateTime.iso8601>2020-01-02T03:04:05</dateTime.iso8601>\
         </value></param></params></methodResponse>"
    );

    let xml = xmlrpc_serde::to_call_bytes("same", &(when,)).unwrap();
    let call = decode_slice(&xml, handler.registry()).unwrap();
    assert_eq!(call.params, vec![Value::DateTime(when.0)]);
    assert_eq!(
        invoke(&call.method, call.params).await.unwrap(),
        Value::DateTime(when.0)
    );
}

#[test]
fn test_whitespace_string_round_trip() {
    let registry = registry();
    for text in ["  ", "\t", " \n "] {
        let xml = xmlrpc_serde::to_call_bytes("echo", &(text,)).unwrap();
        let call = decode_slice(&xml, &registry).unwrap();
        assert_eq!(call.params, vec![Value::String(text.into())]);
    }

    // Plain whitespace text is still ignored.
    let call = decode_slice(call("echo", &param("<string>   </string>")).as_bytes(), &registry)
        .unwrap();
    assert_eq!(call.params, vec![Value::String(String::new())]);
}
