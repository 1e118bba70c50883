use domainmap_core::Domain;

/// Starter news taxonomy used when no data file exists yet
pub fn default_domains() -> Vec<Domain> {
    vec![
        Domain::root("technology", "Technology")
            .with_description("computing, software, gadgets and the internet"),
        Domain::root("politics", "Politics")
            .with_description("government, elections and public policy"),
        Domain::root("sports", "Sports")
            .with_description("professional and amateur athletics"),
        Domain::root("science", "Science")
            .with_description("research, discoveries and the natural world"),
        Domain::root("business", "Business")
            .with_description("companies, markets and the economy"),
        Domain::child("ai", "Artificial Intelligence", "technology")
            .with_description("machine learning, language models and robotics"),
        Domain::child("cybersecurity", "Cybersecurity", "technology")
            .with_description("hacking, data breaches and online privacy"),
        Domain::child("gadgets", "Gadgets", "technology")
            .with_description("phones, laptops and consumer electronics"),
        Domain::child("elections", "Elections", "politics")
            .with_description("campaigns, polls and voting"),
        Domain::child("foreign-policy", "Foreign Policy", "politics")
            .with_description("diplomacy, trade agreements and international relations"),
        Domain::child("football", "Football", "sports")
            .with_description("soccer leagues, transfers and match results"),
        Domain::child("basketball", "Basketball", "sports")
            .with_description("basketball leagues, players and playoffs"),
        Domain::child("tennis", "Tennis", "sports")
            .with_description("grand slams and tennis tournaments"),
        Domain::child("space", "Space", "science")
            .with_description("astronomy, rockets and space exploration"),
        Domain::child("climate", "Climate", "science")
            .with_description("climate change, weather and the environment"),
        Domain::child("health", "Health", "science")
            .with_description("medicine, disease and public health"),
        Domain::child("markets", "Markets", "business")
            .with_description("stocks, bonds and commodities"),
        Domain::child("startups", "Startups", "business")
            .with_description("venture capital and new companies"),
        Domain::child("llms", "Language Models", "ai")
            .with_description("large language models and chat assistants"),
        Domain::child("robotics", "Robotics", "ai")
            .with_description("robots, automation and autonomous vehicles"),
    ]
}
