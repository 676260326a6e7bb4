// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `corefile.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    fn records(pairs: &[(&str, &str)]) -> Vec<HostnameRecord> {
        pairs
            .iter()
            .map(|(host, addr)| HostnameRecord::new(*host, *addr))
            .collect()
    }

    #[test]
    fn test_hosts_block_single_record() {
        let text = generate_hosts_block(&records(&[("app.example.com", "10.0.0.5")]));

        assert_eq!(
            text,
            "# Generated by dnshortcut\n\
             hosts {\n\
             \x20   10.0.0.5 app.example.com\n\
             \x20   fallthrough\n\
             }"
        );
    }

    #[test]
    fn test_hosts_block_empty_store_still_falls_through() {
        let text = generate_hosts_block(&[]);

        assert!(text.starts_with("# Generated by dnshortcut"));
        assert!(text.contains("fallthrough"));
        assert!(text.ends_with('}'));
    }

    #[test]
    fn test_hosts_block_is_order_independent() {
        let forward = records(&[
            ("a.example.com", "10.0.0.1"),
            ("b.example.com", "10.0.0.2"),
            ("c.other.org", "10.0.0.3"),
        ]);
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(generate_hosts_block(&forward), generate_hosts_block(&reversed));
    }

    #[test]
    fn test_hosts_block_has_no_surrounding_whitespace() {
        let text = generate_hosts_block(&records(&[("app.example.com", "10.0.0.5")]));
        assert_eq!(text, text.trim());
    }

    #[test]
    fn test_zone_blocks_split_by_base_domain() {
        let text = generate_zone_blocks(&records(&[
            ("a.example.com", "10.0.0.1"),
            ("b.other.org", "10.0.0.2"),
        ]));

        let example_start = text.find("example.com:53 {").expect("example.com block");
        let other_start = text.find("other.org:53 {").expect("other.org block");
        assert!(example_start < other_start);

        let example_block = &text[example_start..other_start];
        let other_block = &text[other_start..];

        assert!(example_block.contains("10.0.0.1 a.example.com"));
        assert!(!example_block.contains("b.other.org"));
        assert!(other_block.contains("10.0.0.2 b.other.org"));
        assert!(!other_block.contains("a.example.com"));
    }

    #[test]
    fn test_zone_block_directives() {
        let text = generate_zone_blocks(&records(&[("app.example.com", "10.0.0.5")]));

        assert_eq!(
            text,
            "# Generated by dnshortcut\n\
             \n\
             example.com:53 {\n\
             \x20   errors\n\
             \x20   hosts {\n\
             \x20       10.0.0.5 app.example.com\n\
             \x20       fallthrough\n\
             \x20   }\n\
             \x20   forward . /etc/resolv.conf\n\
             \x20   cache 30\n\
             \x20   loop\n\
             \x20   reload\n\
             \x20   loadbalance\n\
             }"
        );
    }

    #[test]
    fn test_zone_blocks_group_siblings_together() {
        let text = generate_zone_blocks(&records(&[
            ("web.example.com", "10.0.0.2"),
            ("api.example.com", "10.0.0.1"),
        ]));

        assert_eq!(text.matches("example.com:53 {").count(), 1);
        let api = text.find("10.0.0.1 api.example.com").expect("api line");
        let web = text.find("10.0.0.2 web.example.com").expect("web line");
        assert!(api < web);
    }

    #[test]
    fn test_zone_blocks_empty_store() {
        assert_eq!(generate_zone_blocks(&[]), "# Generated by dnshortcut");
    }

    #[test]
    fn test_base_domain() {
        assert_eq!(base_domain("app.example.com"), "example.com");
        assert_eq!(base_domain("a.b.example.com"), "b.example.com");
        assert_eq!(base_domain("example.com"), "com");
        assert_eq!(base_domain("localhost"), "localhost");
        assert_eq!(base_domain("trailing."), "trailing.");
    }

    #[test]
    fn test_generate_records_format() {
        let input = records(&[("app.example.com", "10.0.0.5")]);

        let hosts = generate(ConfigFormat::Hosts, &input);
        assert_eq!(hosts.format, ConfigFormat::Hosts);
        assert_eq!(hosts.text, generate_hosts_block(&input));

        let zones = generate(ConfigFormat::Zones, &input);
        assert_eq!(zones.format, ConfigFormat::Zones);
        assert_eq!(zones.text, generate_zone_blocks(&input));
    }

    #[test]
    fn test_config_format_parsing() {
        assert_eq!("hosts".parse::<ConfigFormat>(), Ok(ConfigFormat::Hosts));
        assert_eq!(" Zones ".parse::<ConfigFormat>(), Ok(ConfigFormat::Zones));
        assert_eq!(
            "yaml".parse::<ConfigFormat>(),
            Err(ConfigError::UnknownFormat("yaml".to_string()))
        );
    }

    #[test]
    fn test_config_format_default_keys() {
        assert_eq!(ConfigFormat::Hosts.default_key(), "hosts.override");
        assert_eq!(ConfigFormat::Zones.default_key(), "dnshortcut.server");
        assert_eq!(ConfigFormat::default(), ConfigFormat::Hosts);
        assert_eq!(ConfigFormat::Zones.to_string(), "zones");
    }
}
