//! Email address syntax check.

/// Whether `address` is a plain `local@domain` address.
///
/// Display-name forms (`Name <a@b.c>`) are not accepted.
pub(crate) fn is_valid_address(address: &str) -> bool {
    if address.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    valid_local_part(local) && valid_domain(domain)
}

fn valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !local.contains(['<', '>', '(', ')', ',', ';', ':', '\\', '"', '[', ']'])
}

fn valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 255 {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && tld.chars().count() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        for address in [
            "user@example.com",
            "first.last+tag@mail.example.co.uk",
            "o'brien@example.io",
            "x@xn--bcher-kva.example",
        ] {
            assert!(is_valid_address(address), "{address}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@example",
            "user@@example.com",
            "a@b@example.com",
            "user@example..com",
            ".user@example.com",
            "us..er@example.com",
            "user name@example.com",
            "Name <user@example.com>",
            "user@-example.com",
            "user@example.c",
        ] {
            assert!(!is_valid_address(address), "{address}");
        }
    }
}
