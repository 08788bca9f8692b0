/// Explains a product category and proposes the attributes worth rating.
pub trait DomainAdvisor: Send + Sync {
    fn summarize(&self, category: &str) -> String;
    fn suggested_attributes(&self, category: &str) -> Vec<(String, String)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Laptop,
    Smartphone,
    Composter,
    Other,
}

impl Domain {
    fn of(category: &str) -> Self {
        let category = category.trim().to_lowercase();
        if category == "laptop" {
            Domain::Laptop
        } else if category == "smartphone" {
            Domain::Smartphone
        } else if category.contains("composter") {
            Domain::Composter
        } else {
            Domain::Other
        }
    }
}

const LAPTOP_SUMMARY: &str = "When choosing a laptop, buyers often pay attention to:
  - Processor (CPU): the heart of the laptop, drives overall performance.
  - RAM: matters for multitasking and heavy applications.
  - Storage (SSD/HDD): speed (SSD is much faster) and capacity.
  - Graphics card (GPU): critical for gaming, design and video editing.
  - Display: size, resolution, panel type, brightness.
  - Battery life: runtime on a single charge.
  - Ports: USB-C, HDMI, Thunderbolt and the like.
  - Weight and portability.
  - Price: performance per unit of cost.
  - Build quality and casing materials.";

const SMARTPHONE_SUMMARY: &str = "When choosing a smartphone, buyers often pay attention to:
  - Camera: photo and video quality, number of modules, stabilisation.
  - Processor: app and game speed, overall responsiveness.
  - Screen: size, type (AMOLED/LCD), resolution, refresh rate.
  - Battery: capacity, runtime and charging speed.
  - Memory: built-in storage and RAM.
  - Operating system: Android or iOS.
  - Design and materials, water protection.
  - Network support: 5G availability.
  - Price: specification per unit of cost.";

const COMPOSTER_SUMMARY: &str = "When choosing a composter, buyers often discuss:
  - Bin size: how much waste fits in one batch.
  - Quietness: critical for indoor use.
  - Cycle time: how long a batch takes.
  - Odor control: filters and ventilation, key for home units.
  - Energy use: running cost under continuous use.
  - Maintenance: cleaning, filter changes, consumables.
  - Subscription model: some units need recurring additive or filter purchases.";

const LAPTOP_ATTRIBUTES: &[(&str, &str)] = &[
    ("cpu", "processor (overall performance)"),
    ("ram", "RAM (multitasking)"),
    ("storage", "storage (capacity and speed)"),
    ("gpu", "graphics card (gaming/graphics)"),
    ("screen_size", "screen size"),
    ("battery_life", "battery life"),
    ("ports", "ports (availability of needed connectors)"),
    ("weight", "weight and portability"),
    ("price", "price"),
];

const COMPOSTER_ATTRIBUTES: &[(&str, &str)] = &[
    ("bin_size", "bin size (for waste volume)"),
    ("quietness", "quietness (if silence is important)"),
    ("cycle_time", "cycle time (processing speed)"),
    ("energy_use", "energy consumption"),
    ("odor_control", "odor control"),
    ("maintenance", "maintenance"),
    ("subscription_required", "subscription required"),
];

const SMARTPHONE_ATTRIBUTES: &[(&str, &str)] = &[
    ("camera", "camera (photo/video quality)"),
    ("processor", "processor (operating speed)"),
    ("screen_type", "screen type (AMOLED/LCD)"),
    ("battery_capacity", "battery capacity"),
    ("storage_gb", "built-in storage (GB)"),
    ("os", "operating system (Android/iOS)"),
    ("5g_support", "5G support"),
];

const GENERAL_ATTRIBUTES: &[(&str, &str)] = &[
    ("price", "price"),
    ("quality", "build quality"),
    ("durability", "durability"),
    ("ease_of_use", "ease of use"),
];

/// Fixed catalogue of buyer guides for the categories the extractor understands.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogAdvisor;

impl DomainAdvisor for CatalogAdvisor {
    fn summarize(&self, category: &str) -> String {
        match Domain::of(category) {
            Domain::Laptop => LAPTOP_SUMMARY.to_string(),
            Domain::Smartphone => SMARTPHONE_SUMMARY.to_string(),
            Domain::Composter => COMPOSTER_SUMMARY.to_string(),
            Domain::Other => format!(
                "No specific guide for {}. General aspects include performance, price, durability, and ease of use.",
                category.trim()
            ),
        }
    }

    fn suggested_attributes(&self, category: &str) -> Vec<(String, String)> {
        let table = match Domain::of(category) {
            Domain::Laptop => LAPTOP_ATTRIBUTES,
            Domain::Smartphone => SMARTPHONE_ATTRIBUTES,
            Domain::Composter => COMPOSTER_ATTRIBUTES,
            Domain::Other => GENERAL_ATTRIBUTES,
        };

        table
            .iter()
            .map(|(key, label)| (key.to_string(), label.to_string()))
            .collect()
    }
}
