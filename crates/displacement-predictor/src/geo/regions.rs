/// Representative urban-center coordinate (lat, lon) and capital per department.
pub(crate) const REGIONS: &[(&str, &str, f64, f64)] = &[
    ("Amazonas", "Leticia", -4.2153, -69.9406),
    ("Antioquia", "Medellín", 6.2476, -75.5658),
    ("Arauca", "Arauca", 7.0902, -70.7590),
    ("Atlantico", "Barranquilla", 10.9639, -74.7964),
    ("Bolivar", "Cartagena", 10.4236, -75.5353),
    ("Boyaca", "Tunja", 5.5353, -73.3678),
    ("Caldas", "Manizales", 5.0703, -75.5138),
    ("Caqueta", "Florencia", 1.6144, -75.6062),
    ("Casanare", "Yopal", 5.3378, -72.3959),
    ("Cauca", "Popayán", 2.4419, -76.6063),
    ("Cesar", "Valledupar", 10.4636, -73.2506),
    ("Choco", "Quibdó", 5.6947, -76.6611),
    ("Cordoba", "Montería", 8.7479, -75.8814),
    ("Cundinamarca", "Bogotá", 4.5981, -74.0758),
    ("Guainia", "Inírida", 3.8653, -67.9239),
    ("Guaviare", "San José del Guaviare", 2.5697, -72.6459),
    ("Huila", "Neiva", 2.9273, -75.2819),
    ("La Guajira", "Riohacha", 11.5444, -72.9072),
    ("Magdalena", "Santa Marta", 11.2408, -74.2099),
    ("Meta", "Villavicencio", 4.1420, -73.6266),
    ("Nariño", "Pasto", 1.2136, -77.2811),
    ("Norte De Santander", "Cúcuta", 7.8939, -72.5078),
    ("Putumayo", "Mocoa", 1.1469, -76.6411),
    ("Quindio", "Armenia", 4.5339, -75.6811),
    ("Risaralda", "Pereira", 4.8133, -75.6961),
    (
        "Archipielago de San Andrés, Providencia y Santa Catalina",
        "San Andrés",
        12.5847,
        -81.7006,
    ),
    ("Santander", "Bucaramanga", 7.1254, -73.1198),
    ("Sucre", "Sincelejo", 9.3047, -75.3978),
    ("Tolima", "Ibagué", 4.4389, -75.2322),
    ("Valle del Cauca", "Cali", 3.4372, -76.5225),
    ("Vaupes", "Mitú", 1.2537, -70.2369),
    ("Vichada", "Puerto Carreño", 6.1894, -67.4936),
    ("Bogota, D.C.", "Bogotá", 4.5981, -74.0758),
];
