/// Static descriptor of one offered service. Read-only reference data;
/// matching happens against `keywords`, recommendation flags against
/// `best_for`.
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub link: &'static str,
    pub keywords: &'static [&'static str],
    pub features: &'static [&'static str],
    pub best_for: &'static [&'static str],
    pub description: &'static str,
}

pub static CATALOG: &[ServiceEntry] = &[
    ServiceEntry {
        id: "web-hosting",
        name: "Web Hosting",
        link: "/services/web-hosting",
        keywords: &[
            "web hosting",
            "hosting",
            "host my website",
            "shared hosting",
            "vps",
            "server space",
        ],
        features: &[
            "99.9% uptime guarantee",
            "One-click installs",
            "Daily backups",
            "Free migration",
        ],
        best_for: &["small business", "startups", "online stores", "retail"],
        description: "Fast, managed hosting for sites of any size, from shared plans to VPS.",
    },
    ServiceEntry {
        id: "domain-registration",
        name: "Domain Registration",
        link: "/services/domains",
        keywords: &[
            "domain",
            "domains",
            "domain name",
            "dns",
            "register a domain",
        ],
        features: &[
            "Free WHOIS privacy",
            "Easy DNS management",
            "Auto-renewal",
        ],
        best_for: &["everyone", "small business", "startups"],
        description: "Register and manage domain names with transparent pricing and free privacy.",
    },
    ServiceEntry {
        id: "website-design",
        name: "Website Design",
        link: "/services/website-design",
        keywords: &[
            "website design",
            "web design",
            "landing page",
            "redesign",
            "build a website",
        ],
        features: &[
            "Custom responsive layouts",
            "Content management setup",
            "Launch support",
        ],
        best_for: &["restaurant", "retail", "professional services", "medium business"],
        description: "Custom-designed, mobile-first websites built around your brand.",
    },
    ServiceEntry {
        id: "email-hosting",
        name: "Email Hosting",
        link: "/services/email-hosting",
        keywords: &[
            "email hosting",
            "business email",
            "mailbox",
            "custom email",
        ],
        features: &[
            "Your domain in every address",
            "Spam and virus filtering",
            "Shared calendars",
        ],
        best_for: &["small business", "professional services", "medium business"],
        description: "Professional mailboxes on your own domain with filtering and calendars.",
    },
    ServiceEntry {
        id: "seo-optimization",
        name: "SEO Optimization",
        link: "/services/seo",
        keywords: &[
            "seo",
            "search engine",
            "ranking",
            "google ranking",
            "optimization",
        ],
        features: &[
            "Technical site audit",
            "Keyword strategy",
            "Monthly reporting",
        ],
        best_for: &["retail", "online stores", "restaurant", "large business"],
        description: "Audits and ongoing optimization to move your site up the results page.",
    },
    ServiceEntry {
        id: "ssl-certificates",
        name: "SSL Certificates",
        link: "/services/ssl",
        keywords: &[
            "ssl",
            "certificate",
            "https",
            "security certificate",
        ],
        features: &[
            "Automatic issuance and renewal",
            "Wildcard options",
            "Browser padlock everywhere",
        ],
        best_for: &["everyone", "online stores", "large business"],
        description: "Certificates installed and renewed for you, from single-site to wildcard.",
    },
];

pub fn find(id: &str) -> Option<&'static ServiceEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}
