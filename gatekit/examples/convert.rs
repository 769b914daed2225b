//! Generates conversion functions from a schema document.
//!
//! Run with: `cargo run --example convert -- [schema.xml] [module-root]`
//!
//! Without arguments a built-in gateway schema is used. Set `RUST_LOG=debug`
//! (or `trace`) to follow field resolution.

use anyhow::Context;
use gatekit::prelude::*;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const GATEWAY: &str = r#"<idl>
    <schema name="client" file="clients/users/users.thrift">
        <struct name="User">
            <field name="Id" type="i64" required="true"/>
            <field name="Login" type="string" required="true"/>
            <field name="Groups" type="list[string]" required="true"/>
        </struct>
    </schema>
    <schema name="endpoint" file="endpoints/users/users.thrift">
        <struct name="Owner">
            <field name="Id" type="i64" required="true"/>
            <field name="Name" type="string"/>
        </struct>
        <struct name="GetUserResponse">
            <field name="Owner" type="Owner"/>
            <field name="Groups" type="list[string]" required="true"/>
        </struct>
        <struct name="GetUserResult">
            <field name="User" type="client.User" required="true"/>
        </struct>
    </schema>
    <conversion name="GetUserResponseFromClient" from="endpoint.GetUserResult" to="endpoint.GetUserResponse">
        <mapping to="Owner" from="User" override="true"/>
        <mapping to="Owner.Name" from="User.Login"/>
        <mapping to="Groups" from="User.Groups"/>
    </conversion>
</idl>"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let root = args.get(1).map_or("crate::idl", String::as_str);
    let resolver = ModulePathResolver::new(root);

    let code = match args.first() {
        Some(path) => generate_from_file(Path::new(path), &resolver)
            .with_context(|| format!("failed to generate conversions from {path}"))?,
        None => generate_from_xml(GATEWAY, &resolver)
            .context("failed to generate conversions from the built-in schema")?,
    };

    println!("{code}");
    Ok(())
}
